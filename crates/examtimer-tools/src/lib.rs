//! examtimer-tools — Scratch tools shown alongside each question.
//!
//! A calculator, a memo pad, and a sketch pad. The session clears all three
//! on every question change through [`Resettable`].

pub mod calculator;
pub mod memo;
pub mod sketch;

use examtimer_core::traits::Resettable;

use calculator::Calculator;
use memo::MemoPad;
use sketch::SketchPad;

/// The full scratch tool set for one session.
#[derive(Debug, Clone, Default)]
pub struct ScratchTools {
    pub calculator: Calculator,
    pub memo: MemoPad,
    pub sketch: SketchPad,
}

impl ScratchTools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drawing is blocked while the exam is paused.
    pub fn set_paused(&mut self, paused: bool) {
        self.sketch.set_locked(paused);
    }
}

impl Resettable for ScratchTools {
    fn reset(&mut self) {
        self.calculator.reset();
        self.memo.reset();
        self.sketch.reset();
        tracing::trace!("scratch tools reset");
    }
}
