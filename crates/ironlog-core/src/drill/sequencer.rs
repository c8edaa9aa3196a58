//! Drill sequencer state machine.
//!
//! Like the rest timer, the sequencer never owns a thread: the host calls
//! `tick()` on its poll cadence. Every phase stores the absolute instant it
//! ends, and remaining time is `ceil((end - now) / 1000)` on each poll, so a
//! backgrounded host catches up on its next poll instead of drifting.
//!
//! ```text
//! Ready -start-> Countdown -expiry/skip-> Drill(0) -> ... -> Drill(last) -> Complete
//! Drill(i) -pause/resume-> Drill(i)
//! ```
//!
//! Only one transition happens per poll. A phase that expired while the
//! host was suspended ends on the next poll, and the following phase starts
//! from that poll instant.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Drill, SequencePhase};
use crate::clock::{ceil_secs, Clock, SystemClock};
use crate::error::ValidationError;
use crate::events::Event;

/// Lead-in countdown before the first drill.
pub const LEAD_IN_SECS: u64 = 5;

/// Stored state is checked the same way as a new sequence, so a bad
/// record fails to load instead of panicking later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    bound(serialize = "", deserialize = "C: Default"),
    try_from = "StoredSequencer"
)]
pub struct DrillSequencer<C = SystemClock> {
    run_id: Uuid,
    drills: Vec<Drill>,
    phase: SequencePhase,
    drill_index: usize,
    /// Epoch ms at which the current phase ends; `None` when not counting down.
    phase_ends_at_ms: Option<u64>,
    /// Set exactly while paused.
    paused_remaining_ms: Option<u64>,
    #[serde(skip)]
    clock: C,
}

#[derive(Deserialize)]
struct StoredSequencer {
    run_id: Uuid,
    drills: Vec<Drill>,
    phase: SequencePhase,
    drill_index: usize,
    #[serde(default)]
    phase_ends_at_ms: Option<u64>,
    #[serde(default)]
    paused_remaining_ms: Option<u64>,
}

impl<C: Default> TryFrom<StoredSequencer> for DrillSequencer<C> {
    type Error = ValidationError;

    fn try_from(stored: StoredSequencer) -> Result<Self, Self::Error> {
        check_drills(&stored.drills)?;
        if stored.drill_index >= stored.drills.len() {
            return Err(ValidationError::InvalidValue {
                field: "drill_index".into(),
                message: format!(
                    "{} is past the last of {} drills",
                    stored.drill_index,
                    stored.drills.len()
                ),
            });
        }
        Ok(Self {
            run_id: stored.run_id,
            drills: stored.drills,
            phase: stored.phase,
            drill_index: stored.drill_index,
            phase_ends_at_ms: stored.phase_ends_at_ms,
            paused_remaining_ms: stored.paused_remaining_ms,
            clock: C::default(),
        })
    }
}

fn check_drills(drills: &[Drill]) -> Result<(), ValidationError> {
    if drills.is_empty() {
        return Err(ValidationError::EmptyCollection("drills".into()));
    }
    if let Some(bad) = drills.iter().find(|d| d.duration_secs == 0) {
        return Err(ValidationError::InvalidValue {
            field: "duration_secs".into(),
            message: format!("drill '{}' has no duration", bad.name),
        });
    }
    Ok(())
}

impl DrillSequencer<SystemClock> {
    pub fn new(drills: Vec<Drill>) -> Result<Self, ValidationError> {
        Self::with_clock(drills, SystemClock)
    }
}

impl<C: Clock> DrillSequencer<C> {
    /// Build a sequence in the `Ready` phase.
    ///
    /// Rejects an empty list and drills without a positive duration.
    pub fn with_clock(drills: Vec<Drill>, clock: C) -> Result<Self, ValidationError> {
        check_drills(&drills)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            drills,
            phase: SequencePhase::Ready,
            drill_index: 0,
            phase_ends_at_ms: None,
            paused_remaining_ms: None,
            clock,
        })
    }

    /// Swap the clock, e.g. after deserializing.
    pub fn with_clock_handle(mut self, clock: C) -> Self {
        self.clock = clock;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn drill_index(&self) -> usize {
        self.drill_index
    }

    pub fn drills(&self) -> &[Drill] {
        &self.drills
    }

    /// The drill being performed, only while in the `Drill` phase.
    pub fn current_drill(&self) -> Option<&Drill> {
        match self.phase {
            SequencePhase::Drill => self.drills.get(self.drill_index),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_remaining_ms.is_some()
    }

    pub fn phase_ends_at_ms(&self) -> Option<u64> {
        self.phase_ends_at_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        if let Some(paused) = self.paused_remaining_ms {
            return paused;
        }
        self.phase_ends_at_ms
            .map(|end| end.saturating_sub(self.clock.now_ms()))
            .unwrap_or(0)
    }

    pub fn remaining_secs(&self) -> u64 {
        ceil_secs(self.remaining_ms())
    }

    pub fn phase_duration_secs(&self) -> u64 {
        match self.phase {
            SequencePhase::Countdown => LEAD_IN_SECS,
            SequencePhase::Drill => self.current_drill().map(|d| d.duration_secs).unwrap_or(0),
            SequencePhase::Ready | SequencePhase::Complete => 0,
        }
    }

    /// Lead-in plus every drill, with no pauses.
    pub fn total_duration_secs(&self) -> u64 {
        LEAD_IN_SECS + self.drills.iter().map(|d| d.duration_secs).sum::<u64>()
    }

    /// 0.0 .. 100.0, counting the current drill as done.
    pub fn progress_pct(&self) -> f64 {
        match self.phase {
            SequencePhase::Ready | SequencePhase::Countdown => 0.0,
            SequencePhase::Drill => {
                (self.drill_index + 1) as f64 / self.drills.len() as f64 * 100.0
            }
            SequencePhase::Complete => 100.0,
        }
    }

    pub fn snapshot(&self) -> Event {
        Event::DrillSnapshot {
            run_id: self.run_id,
            phase: self.phase,
            drill_index: self.drill_index,
            drill_name: self.current_drill().map(|d| d.name.clone()),
            remaining_secs: self.remaining_secs(),
            phase_duration_secs: self.phase_duration_secs(),
            is_paused: self.is_paused(),
            progress_pct: self.progress_pct(),
            at: self.clock.now_utc(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.phase != SequencePhase::Ready {
            return None;
        }
        self.phase = SequencePhase::Countdown;
        self.drill_index = 0;
        self.schedule_phase_end(LEAD_IN_SECS * 1000);
        info!(run_id = %self.run_id, drills = self.drills.len(), "drill sequence started");
        Some(Event::DrillSequenceStarted {
            run_id: self.run_id,
            drill_count: self.drills.len(),
            lead_in_secs: LEAD_IN_SECS,
            at: self.clock.now_utc(),
        })
    }

    /// Freeze the current drill. The lead-in cannot be paused.
    pub fn pause(&mut self) -> Option<Event> {
        if self.phase != SequencePhase::Drill || self.is_paused() {
            return None;
        }
        let remaining_ms = self.remaining_ms();
        self.paused_remaining_ms = Some(remaining_ms);
        self.phase_ends_at_ms = None;
        debug!(drill_index = self.drill_index, remaining_ms, "drill paused");
        Some(Event::DrillPaused {
            run_id: self.run_id,
            drill_index: self.drill_index,
            remaining_ms,
            at: self.clock.now_utc(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        let remaining_ms = self.paused_remaining_ms?;
        self.schedule_phase_end(remaining_ms);
        debug!(drill_index = self.drill_index, remaining_ms, "drill resumed");
        Some(Event::DrillResumed {
            run_id: self.run_id,
            drill_index: self.drill_index,
            remaining_ms,
            at: self.clock.now_utc(),
        })
    }

    /// End the current phase now, exactly as if its time had run out.
    pub fn skip(&mut self) -> Vec<Event> {
        if !self.phase.is_timed() {
            return Vec::new();
        }
        self.end_phase(true)
    }

    /// Call periodically. Returns the phase-end event (and the completion
    /// event after the last drill) on the poll that observes zero.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.phase.is_timed() || self.is_paused() || self.remaining_ms() > 0 {
            return Vec::new();
        }
        self.end_phase(false)
    }

    /// Hand a completed sequence back to the caller.
    pub fn acknowledge(&self) -> Option<Event> {
        if self.phase != SequencePhase::Complete {
            return None;
        }
        Some(Event::DrillsAcknowledged {
            run_id: self.run_id,
            drill_ids: self.drills.iter().map(|d| d.id).collect(),
            at: self.clock.now_utc(),
        })
    }

    /// Abandon the sequence. The caller confirms before calling this.
    pub fn exit(self) -> Event {
        info!(run_id = %self.run_id, phase = ?self.phase, "drill sequence exited");
        Event::DrillSequenceExited {
            run_id: self.run_id,
            phase: self.phase,
            drill_index: self.drill_index,
            at: self.clock.now_utc(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn schedule_phase_end(&mut self, duration_ms: u64) {
        self.paused_remaining_ms = None;
        self.phase_ends_at_ms = Some(self.clock.now_ms().saturating_add(duration_ms));
    }

    fn end_phase(&mut self, skipped: bool) -> Vec<Event> {
        let ended = self.phase;
        let ended_index = self.drill_index;

        let next_index = match ended {
            SequencePhase::Countdown => Some(0),
            _ if self.drill_index + 1 < self.drills.len() => Some(self.drill_index + 1),
            _ => None,
        };

        match next_index {
            Some(index) => {
                self.phase = SequencePhase::Drill;
                self.drill_index = index;
                let duration_ms = self.drills[index].duration_ms();
                self.schedule_phase_end(duration_ms);
            }
            None => {
                self.phase = SequencePhase::Complete;
                self.phase_ends_at_ms = None;
                self.paused_remaining_ms = None;
            }
        }
        debug!(?ended, ended_index, next = ?self.phase, skipped, "drill phase ended");

        let at = self.clock.now_utc();
        let mut events = vec![Event::DrillPhaseEnded {
            run_id: self.run_id,
            ended,
            drill_index: ended_index,
            next: self.phase,
            skipped,
            at,
        }];
        if self.phase == SequencePhase::Complete {
            info!(run_id = %self.run_id, "drill sequence complete");
            events.push(Event::DrillSequenceCompleted {
                run_id: self.run_id,
                drill_count: self.drills.len(),
                at,
            });
        }
        events
    }
}
