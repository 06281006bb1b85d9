//! Countdown, stopwatch, and the single-slot ticker registry.
//!
//! Timers here never sleep or spawn anything. A driver delivers one tick per
//! second for whichever `TickerId` is currently armed, and the session feeds
//! those ticks into the countdown or refreshes the stopwatch display.

use serde::{Deserialize, Serialize};

/// Lifecycle of a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// What a single tick did to a countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The countdown was not running (idle, paused, or already expired).
    Ignored,
    /// One second elapsed; this many remain.
    Running(u32),
    /// The countdown just reached zero. Reported exactly once per start.
    Expired,
}

/// One-second-resolution countdown used for subjects and breaks.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining_secs: u32,
    state: TimerState,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            remaining_secs: 0,
            state: TimerState::Idle,
        }
    }

    pub fn start(&mut self, secs: u32) {
        self.remaining_secs = secs;
        self.state = TimerState::Running;
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Idle;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TimerState::Running {
            return TickOutcome::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = TimerState::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_secs)
        }
    }

    /// Flip between running and paused. Returns the new paused flag, or
    /// `None` when the countdown is idle or expired and the toggle was ignored.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Some(true)
            }
            TimerState::Paused => {
                self.state = TimerState::Running;
                Some(false)
            }
            TimerState::Idle | TimerState::Expired => None,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }
}

/// Seconds between two wall-clock readings, rounded half-up and floored at
/// zero so a clock that steps backwards never produces negative time.
pub fn elapsed_secs(from_ms: i64, to_ms: i64) -> u64 {
    let delta = to_ms.saturating_sub(from_ms);
    if delta <= 0 {
        return 0;
    }
    ((delta as u64) + 500) / 1000
}

/// Practice stopwatch for the question on screen.
///
/// `base_secs` is whatever the question had already accumulated on earlier
/// visits, so the display keeps counting up from the prior total.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_at_ms: Option<i64>,
    base_secs: u64,
}

impl Stopwatch {
    pub fn start(&mut self, now_ms: i64, base_secs: u64) {
        self.started_at_ms = Some(now_ms);
        self.base_secs = base_secs;
    }

    pub fn stop(&mut self) {
        self.started_at_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    pub fn total_secs(&self, now_ms: i64) -> u64 {
        let running = self
            .started_at_ms
            .map(|start| elapsed_secs(start, now_ms))
            .unwrap_or(0);
        self.base_secs + running
    }
}

/// Opaque handle for an armed ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickerId(u64);

impl TickerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Which timer a ticker feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerKind {
    Countdown,
    Stopwatch,
}

/// Holds at most one armed ticker.
///
/// Arming always cancels the previous handle first, so a stale tick can be
/// recognised by comparing ids.
#[derive(Debug, Default)]
pub struct TickerSlot {
    next_id: u64,
    active: Option<(TickerId, TickerKind)>,
}

impl TickerSlot {
    pub fn arm(&mut self, kind: TickerKind) -> TickerId {
        self.cancel();
        self.next_id += 1;
        let id = TickerId(self.next_id);
        self.active = Some((id, kind));
        tracing::trace!(ticker = id.0, ?kind, "ticker armed");
        id
    }

    pub fn cancel(&mut self) -> Option<TickerId> {
        let cancelled = self.active.take().map(|(id, _)| id);
        if let Some(id) = cancelled {
            tracing::trace!(ticker = id.0, "ticker cancelled");
        }
        cancelled
    }

    pub fn active(&self) -> Option<TickerId> {
        self.active.map(|(id, _)| id)
    }

    pub fn kind_of(&self, id: TickerId) -> Option<TickerKind> {
        self.active
            .filter(|(active, _)| *active == id)
            .map(|(_, kind)| kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_expires_exactly_once() {
        let mut cd = Countdown::new();
        cd.start(3);
        assert_eq!(cd.tick(), TickOutcome::Running(2));
        assert_eq!(cd.tick(), TickOutcome::Running(1));
        assert_eq!(cd.tick(), TickOutcome::Expired);
        assert_eq!(cd.tick(), TickOutcome::Ignored);
        assert_eq!(cd.tick(), TickOutcome::Ignored);
        assert_eq!(cd.remaining_secs(), 0);
        assert_eq!(cd.state(), TimerState::Expired);
    }

    #[test]
    fn countdown_never_negative_from_zero_start() {
        let mut cd = Countdown::new();
        cd.start(0);
        assert_eq!(cd.tick(), TickOutcome::Expired);
        assert_eq!(cd.remaining_secs(), 0);
    }

    #[test]
    fn pause_freezes_without_reset() {
        let mut cd = Countdown::new();
        cd.start(10);
        cd.tick();
        assert_eq!(cd.toggle_pause(), Some(true));
        assert_eq!(cd.tick(), TickOutcome::Ignored);
        assert_eq!(cd.remaining_secs(), 9);
        assert_eq!(cd.toggle_pause(), Some(false));
        assert_eq!(cd.tick(), TickOutcome::Running(8));
    }

    #[test]
    fn pause_ignored_after_expiry() {
        let mut cd = Countdown::new();
        cd.start(1);
        assert_eq!(cd.tick(), TickOutcome::Expired);
        assert_eq!(cd.toggle_pause(), None);
        assert_eq!(cd.state(), TimerState::Expired);
    }

    #[test]
    fn elapsed_rounds_and_floors() {
        assert_eq!(elapsed_secs(0, 0), 0);
        assert_eq!(elapsed_secs(0, 499), 0);
        assert_eq!(elapsed_secs(0, 500), 1);
        assert_eq!(elapsed_secs(0, 45_200), 45);
        assert_eq!(elapsed_secs(10_000, 2_000), 0);
    }

    #[test]
    fn stopwatch_counts_from_base() {
        let mut sw = Stopwatch::default();
        sw.start(1_000, 12);
        assert_eq!(sw.total_secs(4_000), 15);
        sw.stop();
        assert!(!sw.is_running());
        assert_eq!(sw.total_secs(9_000), 12);
    }

    #[test]
    fn arming_cancels_previous_ticker() {
        let mut slot = TickerSlot::default();
        let first = slot.arm(TickerKind::Countdown);
        let second = slot.arm(TickerKind::Stopwatch);
        assert_ne!(first, second);
        assert_eq!(slot.active(), Some(second));
        assert_eq!(slot.kind_of(first), None);
        assert_eq!(slot.kind_of(second), Some(TickerKind::Stopwatch));
        assert_eq!(slot.cancel(), Some(second));
        assert_eq!(slot.active(), None);
    }
}
