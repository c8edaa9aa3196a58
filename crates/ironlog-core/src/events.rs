use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::drill::SequencePhase;
use crate::timer::TimerState;

/// Every state change in the rest timer or drill sequencer produces an Event.
/// The host polls for events and hands them to a notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RestStarted {
        duration_secs: u64,
        exercise_id: Option<i64>,
        set_id: Option<i64>,
        at: DateTime<Utc>,
    },
    RestPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    RestResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    RestExtended {
        delta_secs: i64,
        remaining_secs: u64,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    RestReset {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    RestStopped {
        at: DateTime<Utc>,
    },
    /// Fired once when the rest countdown reaches zero.
    RestCompleted {
        total_secs: u64,
        exercise_id: Option<i64>,
        set_id: Option<i64>,
        at: DateTime<Utc>,
    },
    RestSnapshot {
        state: TimerState,
        remaining_secs: u64,
        total_secs: u64,
        exercise_id: Option<i64>,
        set_id: Option<i64>,
        at: DateTime<Utc>,
    },
    DrillSequenceStarted {
        run_id: Uuid,
        drill_count: usize,
        lead_in_secs: u64,
        at: DateTime<Utc>,
    },
    DrillPaused {
        run_id: Uuid,
        drill_index: usize,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    DrillResumed {
        run_id: Uuid,
        drill_index: usize,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// A countdown or drill phase ended, naturally or by skip.
    DrillPhaseEnded {
        run_id: Uuid,
        ended: SequencePhase,
        drill_index: usize,
        next: SequencePhase,
        skipped: bool,
        at: DateTime<Utc>,
    },
    /// Fired once when the last drill ends.
    DrillSequenceCompleted {
        run_id: Uuid,
        drill_count: usize,
        at: DateTime<Utc>,
    },
    DrillsAcknowledged {
        run_id: Uuid,
        drill_ids: Vec<i64>,
        at: DateTime<Utc>,
    },
    DrillSequenceExited {
        run_id: Uuid,
        phase: SequencePhase,
        drill_index: usize,
        at: DateTime<Utc>,
    },
    DrillSnapshot {
        run_id: Uuid,
        phase: SequencePhase,
        drill_index: usize,
        drill_name: Option<String>,
        remaining_secs: u64,
        phase_duration_secs: u64,
        is_paused: bool,
        progress_pct: f64,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for events that mark the end of a timed phase.
    pub fn is_phase_end(&self) -> bool {
        matches!(
            self,
            Event::RestCompleted { .. } | Event::DrillPhaseEnded { .. }
        )
    }
}
