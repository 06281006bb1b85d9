//! Seams between the session core and its environment.
//!
//! The session never reads the system time, prompts the user, or touches a
//! scratch tool directly; it goes through these traits instead so a terminal
//! driver, a test harness, or any other front-end can plug in.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::session::SessionEvent;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Cloning shares the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }

    /// Jump to an absolute time; may move backwards to simulate skew.
    pub fn set_ms(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Front-end
// ---------------------------------------------------------------------------

/// Yes/no questions the session may ask the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Exam mode: moving on without selecting an option.
    AdvanceUnanswered,
    /// Practice mode: the user asked to stop.
    ExitPractice,
    /// Practice mode: the last question was passed.
    FinishPractice,
}

impl Confirmation {
    pub fn message(self) -> &'static str {
        match self {
            Confirmation::AdvanceUnanswered => {
                "No answer selected. Move to the next question?"
            }
            Confirmation::ExitPractice => "End the practice session?",
            Confirmation::FinishPractice => "This is the last question. End the practice session?",
        }
    }
}

/// Everything the session needs from whoever is presenting it.
pub trait Frontend {
    /// Ask a yes/no question; the session branches on the answer immediately.
    fn confirm(&mut self, prompt: Confirmation) -> bool;

    /// Clear the scratch tools. Called on every question change.
    fn reset_tools(&mut self);

    /// Receive a state-change notification.
    fn on_event(&mut self, event: &SessionEvent);
}

/// A tool that can be returned to its blank state.
pub trait Resettable {
    fn reset(&mut self);
}

/// Front-end that answers every confirmation the same way and records
/// everything it is told.
#[derive(Debug, Default)]
pub struct ScriptedFrontend {
    /// Answer returned by `confirm`.
    pub answer: bool,
    /// Confirmations asked, in order.
    pub prompts: Vec<Confirmation>,
    /// Number of tool resets.
    pub resets: usize,
    /// Events received, in order.
    pub events: Vec<SessionEvent>,
}

impl ScriptedFrontend {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Default::default()
        }
    }
}

impl Frontend for ScriptedFrontend {
    fn confirm(&mut self, prompt: Confirmation) -> bool {
        self.prompts.push(prompt);
        self.answer
    }

    fn reset_tools(&mut self) {
        self.resets += 1;
    }

    fn on_event(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance_secs(2);
        assert_eq!(other.now_ms(), 3_000);
        other.set_ms(500);
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn scripted_frontend_records_prompts() {
        let mut fe = ScriptedFrontend::answering(true);
        assert!(fe.confirm(Confirmation::ExitPractice));
        fe.reset_tools();
        assert_eq!(fe.prompts, vec![Confirmation::ExitPractice]);
        assert_eq!(fe.resets, 1);
    }
}
