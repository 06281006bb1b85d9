//! examtimer-report — HTML and Markdown rendering of finished sessions.
//!
//! Both renderers work from [`examtimer_core::results::ResultTable`], so they
//! agree with the terminal output on every row and cell.

pub mod html;
pub mod markdown;
