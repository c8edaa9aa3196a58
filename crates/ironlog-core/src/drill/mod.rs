//! Auto-advancing drill sequences.
//!
//! A sequence is a fixed list of short timed drills (ball-handling warm-ups,
//! for example) run back-to-back after a short lead-in countdown.

mod sequencer;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use sequencer::{DrillSequencer, LEAD_IN_SECS};

/// Seconds per drill when a workout does not say otherwise.
pub const DEFAULT_DRILL_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drill {
    pub id: i64,
    pub name: String,
    pub duration_secs: u64,
}

impl Drill {
    pub fn new(id: i64, name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            id,
            name: name.into(),
            duration_secs,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_secs.saturating_mul(1000)
    }

    /// Parse a `name:secs` descriptor, e.g. `"Crossovers:20"`.
    ///
    /// A bare name uses [`DEFAULT_DRILL_SECS`].
    pub fn parse(id: i64, descriptor: &str) -> Result<Self, ValidationError> {
        let (name, secs) = match descriptor.rsplit_once(':') {
            Some((name, secs)) => {
                let secs = secs
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ValidationError::InvalidValue {
                        field: "drill".into(),
                        message: format!("'{secs}' is not a number of seconds"),
                    })?;
                (name.trim(), secs)
            }
            None => (descriptor.trim(), DEFAULT_DRILL_SECS),
        };
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "drill".into(),
                message: "drill name is empty".into(),
            });
        }
        Ok(Self::new(id, name, secs))
    }
}

/// Where a sequence currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencePhase {
    Ready,
    /// Lead-in before the first drill.
    Countdown,
    Drill,
    Complete,
}

impl SequencePhase {
    /// Phases with a running (or paused) countdown.
    pub fn is_timed(self) -> bool {
        matches!(self, SequencePhase::Countdown | SequencePhase::Drill)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_seconds() {
        let d = Drill::parse(3, "Figure Eights:20").unwrap();
        assert_eq!(d, Drill::new(3, "Figure Eights", 20));
    }

    #[test]
    fn parse_bare_name_uses_default() {
        let d = Drill::parse(1, "Pound Dribble").unwrap();
        assert_eq!(d.duration_secs, DEFAULT_DRILL_SECS);
    }

    #[test]
    fn parse_rejects_bad_seconds_and_empty_name() {
        assert!(Drill::parse(1, "Crossover:abc").is_err());
        assert!(Drill::parse(1, ":15").is_err());
    }

    #[test]
    fn timed_phases() {
        assert!(SequencePhase::Countdown.is_timed());
        assert!(SequencePhase::Drill.is_timed());
        assert!(!SequencePhase::Ready.is_timed());
        assert!(!SequencePhase::Complete.is_timed());
    }
}
