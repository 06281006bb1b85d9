//! examtimer-core — Session state machine, timers, and scoring.
//!
//! This crate defines the data model, the single-writer exam/practice
//! session, answer-key validation and scoring, and the result table that
//! every output format renders from.

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod report;
pub mod results;
pub mod scoring;
pub mod session;
pub mod timer;
pub mod traits;
