//! Discussion timer.
//!
//! Counts down in whole seconds on the same tick that drives the elapsed
//! game clock. It never reads or writes the ledgers.

use serde::{Deserialize, Serialize};

/// A countdown for the day's debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionTimer {
    /// Length the timer was started with.
    pub duration_seconds: u32,
    /// Seconds left.
    pub remaining_seconds: u32,
    /// Whether ticks count down.
    pub running: bool,
}

impl DiscussionTimer {
    /// A running timer with the full duration left.
    #[must_use]
    pub const fn started(duration_seconds: u32) -> Self {
        Self {
            duration_seconds,
            remaining_seconds: duration_seconds,
            running: true,
        }
    }

    /// Whether the countdown reached zero.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// Stops counting down.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Continues counting down.
    pub fn resume(&mut self) {
        self.running = !self.is_expired();
    }

    /// Back to the full duration, paused.
    pub fn reset(&mut self) {
        self.remaining_seconds = self.duration_seconds;
        self.running = false;
    }

    /// Counts `seconds` down if running. Stops at zero.
    pub fn tick(&mut self, seconds: u32) {
        if !self.running {
            return;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(seconds);
        if self.is_expired() {
            self.running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_down_and_stops_at_zero() {
        let mut timer = DiscussionTimer::started(3);

        timer.tick(2);
        assert_eq!(timer.remaining_seconds, 1);
        assert!(timer.running);

        timer.tick(5);
        assert_eq!(timer.remaining_seconds, 0);
        assert!(!timer.running);
        assert!(timer.is_expired());
    }

    #[test]
    fn test_paused_timer_ignores_ticks() {
        let mut timer = DiscussionTimer::started(60);
        timer.pause();

        timer.tick(10);

        assert_eq!(timer.remaining_seconds, 60);
    }

    #[test]
    fn test_reset_restores_duration_paused() {
        let mut timer = DiscussionTimer::started(60);
        timer.tick(45);

        timer.reset();

        assert_eq!(timer.remaining_seconds, 60);
        assert!(!timer.running);
    }

    #[test]
    fn test_expired_timer_does_not_resume() {
        let mut timer = DiscussionTimer::started(1);
        timer.tick(1);

        timer.resume();

        assert!(!timer.running);
    }
}
