//! Rest timer between sets.
//!
//! The timer is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically.
//! While running it stores the absolute instant the rest ends, so remaining
//! time is always recomputed from the clock and survives the host being
//! suspended or restarted.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!         Running -> Completed (once, on tick)
//! any -> Idle (stop)
//! ```
//!
//! `start` while active silently replaces the running timer, exactly as if
//! `stop` had been called first.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{ceil_secs, Clock, SystemClock};
use crate::error::ValidationError;
use crate::events::Event;

/// Longest rest accepted by [`validate_duration`] (3 hours).
pub const MAX_REST_SECS: u64 = 3 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero. Stays here until the next `start` or `stop`.
    Completed,
}

/// Countdown for a single rest interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "C: Default"))]
pub struct RestTimer<C = SystemClock> {
    state: TimerState,
    total_secs: u64,
    /// Epoch ms at which the countdown reaches zero (Running only).
    #[serde(default)]
    ends_at_ms: Option<u64>,
    /// Remaining time frozen at the pause instant (Paused only).
    #[serde(default)]
    paused_remaining_ms: Option<u64>,
    #[serde(default)]
    started_at_ms: Option<u64>,
    #[serde(default)]
    target_exercise_id: Option<i64>,
    #[serde(default)]
    target_set_id: Option<i64>,
    #[serde(skip, default)]
    clock: C,
}

/// Check a user-supplied rest duration. The timer itself accepts any
/// value; callers validate before `start`.
pub fn validate_duration(secs: u64) -> Result<u64, ValidationError> {
    if secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "duration_secs".into(),
            message: "rest duration must be greater than zero".into(),
        });
    }
    if secs > MAX_REST_SECS {
        return Err(ValidationError::InvalidValue {
            field: "duration_secs".into(),
            message: format!("rest duration must be at most {MAX_REST_SECS} seconds"),
        });
    }
    Ok(secs)
}

impl RestTimer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RestTimer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RestTimer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            state: TimerState::Idle,
            total_secs: 0,
            ends_at_ms: None,
            paused_remaining_ms: None,
            started_at_ms: None,
            target_exercise_id: None,
            target_set_id: None,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Started and not stopped (a completed timer is still active).
    pub fn is_active(&self) -> bool {
        self.state != TimerState::Idle
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_ms(&self) -> u64 {
        match self.state {
            TimerState::Idle | TimerState::Completed => 0,
            TimerState::Paused => self.paused_remaining_ms.unwrap_or(0),
            TimerState::Running => self
                .ends_at_ms
                .map(|end| end.saturating_sub(self.clock.now_ms()))
                .unwrap_or(0),
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.remaining_ms()).min(self.total_secs)
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn target_exercise_id(&self) -> Option<i64> {
        self.target_exercise_id
    }

    pub fn target_set_id(&self) -> Option<i64> {
        self.target_set_id
    }

    /// Seconds rested so far, `None` when no timer is active.
    pub fn rest_time_secs(&self) -> Option<u64> {
        self.is_active()
            .then(|| self.total_secs.saturating_sub(self.remaining_secs()))
    }

    /// 0.0 .. 1.0 progress through the rest.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        let total_ms = self.total_secs.saturating_mul(1000) as f64;
        (1.0 - self.remaining_ms() as f64 / total_ms).clamp(0.0, 1.0)
    }

    /// Swap the clock, e.g. after deserializing a timer that was saved
    /// with a different clock handle.
    pub fn with_clock_handle(mut self, clock: C) -> Self {
        self.clock = clock;
        self
    }

    pub fn snapshot(&self) -> Event {
        Event::RestSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs,
            exercise_id: self.target_exercise_id,
            set_id: self.target_set_id,
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(
        &mut self,
        duration_secs: u64,
        exercise_id: Option<i64>,
        set_id: Option<i64>,
    ) -> Option<Event> {
        if self.is_active() {
            debug!(state = ?self.state, "replacing active rest timer");
        }
        let now = self.clock.now_ms();
        self.state = TimerState::Running;
        self.total_secs = duration_secs;
        self.ends_at_ms = Some(now.saturating_add(duration_secs.saturating_mul(1000)));
        self.paused_remaining_ms = None;
        self.started_at_ms = Some(now);
        self.target_exercise_id = exercise_id;
        self.target_set_id = set_id;
        debug!(duration_secs, ?exercise_id, ?set_id, "rest timer started");
        Some(Event::RestStarted {
            duration_secs,
            exercise_id,
            set_id,
            at: self.clock.now_utc(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        let remaining_ms = self.remaining_ms();
        self.state = TimerState::Paused;
        self.paused_remaining_ms = Some(remaining_ms);
        self.ends_at_ms = None;
        debug!(remaining_ms, "rest timer paused");
        Some(Event::RestPaused {
            remaining_ms,
            at: self.clock.now_utc(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.state != TimerState::Paused {
            return None;
        }
        let remaining_ms = self.paused_remaining_ms.take().unwrap_or(0);
        self.state = TimerState::Running;
        self.ends_at_ms = Some(self.clock.now_ms().saturating_add(remaining_ms));
        debug!(remaining_ms, "rest timer resumed");
        Some(Event::RestResumed {
            remaining_ms,
            at: self.clock.now_utc(),
        })
    }

    /// Return to idle. Never fires a completion.
    pub fn stop(&mut self) -> Option<Event> {
        let was_idle = self.state == TimerState::Idle;
        self.state = TimerState::Idle;
        self.total_secs = 0;
        self.ends_at_ms = None;
        self.paused_remaining_ms = None;
        self.started_at_ms = None;
        self.target_exercise_id = None;
        self.target_set_id = None;
        if was_idle {
            return None;
        }
        debug!("rest timer stopped");
        Some(Event::RestStopped {
            at: self.clock.now_utc(),
        })
    }

    /// Restart the countdown from the full duration, unpaused.
    pub fn reset(&mut self) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        let now = self.clock.now_ms();
        self.state = TimerState::Running;
        self.paused_remaining_ms = None;
        self.ends_at_ms = Some(now.saturating_add(self.total_secs.saturating_mul(1000)));
        self.started_at_ms = Some(now);
        Some(Event::RestReset {
            total_secs: self.total_secs,
            at: self.clock.now_utc(),
        })
    }

    /// Extend (or shorten, with a negative delta) the rest.
    ///
    /// The delta applies to both remaining and total time; neither goes
    /// below zero. A completed timer extended past zero runs again.
    pub fn add_time(&mut self, delta_secs: i64) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        let delta_ms = delta_secs.saturating_mul(1000);
        let remaining_ms = shift(self.remaining_ms(), delta_ms);
        self.total_secs = shift(self.total_secs, delta_secs);

        match self.state {
            TimerState::Paused => self.paused_remaining_ms = Some(remaining_ms),
            TimerState::Running => {
                self.ends_at_ms = Some(self.clock.now_ms().saturating_add(remaining_ms));
            }
            TimerState::Completed if remaining_ms > 0 => {
                self.state = TimerState::Running;
                self.ends_at_ms = Some(self.clock.now_ms().saturating_add(remaining_ms));
            }
            _ => {}
        }
        Some(Event::RestExtended {
            delta_secs,
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs,
            at: self.clock.now_utc(),
        })
    }

    /// Call periodically. Returns `Some(Event::RestCompleted)` exactly once,
    /// on the poll that observes the countdown at zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running || self.remaining_ms() > 0 {
            return None;
        }
        self.state = TimerState::Completed;
        self.ends_at_ms = None;
        debug!(total_secs = self.total_secs, "rest timer completed");
        Some(Event::RestCompleted {
            total_secs: self.total_secs,
            exercise_id: self.target_exercise_id,
            set_id: self.target_set_id,
            at: self.clock.now_utc(),
        })
    }
}

fn shift(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn timer() -> (RestTimer<ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        (RestTimer::with_clock(clock.clone()), clock)
    }

    #[test]
    fn start_sets_full_duration() {
        let (mut t, _clock) = timer();
        assert!(t.start(90, Some(1), Some(7)).is_some());
        assert_eq!(t.state(), TimerState::Running);
        assert!(t.is_active());
        assert_eq!(t.remaining_secs(), 90);
        assert_eq!(t.total_secs(), 90);
        assert_eq!(t.target_set_id(), Some(7));
        assert_eq!(t.started_at_ms(), Some(1_700_000_000_000));
    }

    #[test]
    fn progress_tracks_elapsed_share() {
        let (mut t, clock) = timer();
        assert_eq!(t.progress(), 0.0);
        t.start(60, None, None);
        clock.advance_secs(15);
        assert!((t.progress() - 0.25).abs() < 1e-9);
        clock.advance_secs(60);
        assert_eq!(t.progress(), 1.0);
    }

    #[test]
    fn countdown_follows_clock() {
        let (mut t, clock) = timer();
        t.start(90, None, None);
        clock.advance_ms(29_500);
        assert_eq!(t.remaining_secs(), 61);
        clock.advance_ms(500);
        assert_eq!(t.remaining_secs(), 60);
    }

    #[test]
    fn pause_freezes_through_long_gap() {
        let (mut t, clock) = timer();
        t.start(90, None, None);
        clock.advance_secs(30);
        t.pause();
        clock.advance_secs(500);
        assert_eq!(t.remaining_secs(), 60);
        t.resume();
        assert_eq!(t.remaining_secs(), 60);
        clock.advance_secs(10);
        assert_eq!(t.remaining_secs(), 50);
    }

    #[test]
    fn pause_keeps_sub_second_precision() {
        let (mut t, clock) = timer();
        t.start(10, None, None);
        clock.advance_ms(2_250);
        t.pause();
        assert_eq!(t.remaining_ms(), 7_750);
        t.resume();
        assert_eq!(t.remaining_ms(), 7_750);
    }

    #[test]
    fn redundant_pause_and_resume_are_noops() {
        let (mut t, clock) = timer();
        assert!(t.pause().is_none());
        assert!(t.resume().is_none());
        t.start(60, None, None);
        assert!(t.resume().is_none());
        assert!(t.pause().is_some());
        clock.advance_secs(3);
        assert!(t.pause().is_none());
        assert_eq!(t.remaining_secs(), 60);
        assert!(t.resume().is_some());
        assert!(t.resume().is_none());
    }

    #[test]
    fn completion_fires_exactly_once() {
        let (mut t, clock) = timer();
        t.start(5, Some(2), Some(3));
        clock.advance_secs(4);
        assert!(t.tick().is_none());
        clock.advance_secs(2);
        let fired: Vec<_> = (0..5).filter_map(|_| t.tick()).collect();
        assert_eq!(fired.len(), 1);
        assert!(matches!(
            fired[0],
            Event::RestCompleted { total_secs: 5, set_id: Some(3), .. }
        ));
        assert_eq!(t.state(), TimerState::Completed);
        assert!(t.is_active());
        assert_eq!(t.remaining_secs(), 0);
        clock.advance_secs(60);
        assert!(t.tick().is_none());
    }

    #[test]
    fn paused_timer_never_completes() {
        let (mut t, clock) = timer();
        t.start(5, None, None);
        t.pause();
        clock.advance_secs(100);
        assert!(t.tick().is_none());
        assert_eq!(t.state(), TimerState::Paused);
    }

    #[test]
    fn stop_returns_to_idle_without_completion() {
        let (mut t, clock) = timer();
        t.start(5, Some(1), Some(1));
        assert!(matches!(t.stop(), Some(Event::RestStopped { .. })));
        clock.advance_secs(10);
        assert!(t.tick().is_none());
        assert_eq!(t.state(), TimerState::Idle);
        assert_eq!(t.total_secs(), 0);
        assert!(t.target_set_id().is_none());
        assert!(t.stop().is_none());
    }

    #[test]
    fn start_while_active_replaces_timer() {
        let (mut t, clock) = timer();
        t.start(90, Some(1), Some(1));
        clock.advance_secs(20);
        t.pause();
        t.start(30, Some(2), Some(5));
        assert_eq!(t.state(), TimerState::Running);
        assert_eq!(t.remaining_secs(), 30);
        assert_eq!(t.target_exercise_id(), Some(2));
    }

    #[test]
    fn reset_restores_full_duration() {
        let (mut t, clock) = timer();
        assert!(t.reset().is_none());
        t.start(60, None, None);
        clock.advance_secs(45);
        t.pause();
        t.reset();
        assert_eq!(t.state(), TimerState::Running);
        assert_eq!(t.remaining_secs(), 60);
    }

    #[test]
    fn add_time_changes_remaining_and_total() {
        let (mut t, clock) = timer();
        t.start(90, None, None);
        clock.advance_secs(10);
        t.add_time(30);
        assert_eq!(t.remaining_secs(), 110);
        assert_eq!(t.total_secs(), 120);
        t.add_time(-30);
        assert_eq!(t.remaining_secs(), 80);
        assert_eq!(t.total_secs(), 90);
    }

    #[test]
    fn negative_add_time_clamps_at_zero() {
        let (mut t, _clock) = timer();
        t.start(20, None, None);
        t.add_time(-45);
        assert_eq!(t.remaining_secs(), 0);
        assert_eq!(t.total_secs(), 0);
        assert!(matches!(t.tick(), Some(Event::RestCompleted { .. })));
    }

    #[test]
    fn add_time_on_paused_timer_stays_paused() {
        let (mut t, clock) = timer();
        t.start(60, None, None);
        t.pause();
        t.add_time(15);
        clock.advance_secs(100);
        assert_eq!(t.state(), TimerState::Paused);
        assert_eq!(t.remaining_secs(), 75);
    }

    #[test]
    fn add_time_revives_completed_timer() {
        let (mut t, clock) = timer();
        t.start(5, None, None);
        clock.advance_secs(5);
        t.tick();
        t.add_time(30);
        assert_eq!(t.state(), TimerState::Running);
        assert_eq!(t.remaining_secs(), 30);
        clock.advance_secs(30);
        assert!(t.tick().is_some());
    }

    #[test]
    fn add_time_on_idle_timer_is_noop() {
        let (mut t, _clock) = timer();
        assert!(t.add_time(30).is_none());
        assert_eq!(t.total_secs(), 0);
    }

    #[test]
    fn rest_time_is_elapsed_seconds() {
        let (mut t, clock) = timer();
        assert!(t.rest_time_secs().is_none());
        t.start(90, None, None);
        clock.advance_secs(30);
        assert_eq!(t.rest_time_secs(), Some(30));
    }

    #[test]
    fn validate_duration_rejects_zero_and_huge() {
        assert!(validate_duration(0).is_err());
        assert!(validate_duration(MAX_REST_SECS + 1).is_err());
        assert_eq!(validate_duration(90), Ok(90));
    }

    #[test]
    fn serialized_timer_resumes_from_end_instant() {
        let (mut t, clock) = timer();
        t.start(90, Some(4), Some(9));
        clock.advance_secs(10);
        let json = serde_json::to_string(&t).unwrap();

        let mut restored: RestTimer<ManualClock> = serde_json::from_str(&json).unwrap();
        restored = restored.with_clock_handle(clock.clone());
        clock.advance_secs(20);
        assert_eq!(restored.remaining_secs(), 60);
        assert_eq!(restored.target_set_id(), Some(9));
    }

    #[test]
    fn snapshot_reports_state() {
        let (mut t, _clock) = timer();
        t.start(45, None, Some(2));
        match t.snapshot() {
            Event::RestSnapshot {
                state,
                remaining_secs,
                total_secs,
                set_id,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(remaining_secs, 45);
                assert_eq!(total_secs, 45);
                assert_eq!(set_id, Some(2));
            }
            other => panic!("Expected RestSnapshot, got {other:?}"),
        }
    }
}
