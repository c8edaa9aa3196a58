//! Active workout state and the bridge to the workout record store.
//!
//! The workout record store is an external collaborator. This module only
//! knows the [`SetUpdate`] it sends and the [`WorkoutStore`] trait it sends
//! it through.

mod session;

use serde::{Deserialize, Serialize};

use crate::drill::Drill;
use crate::error::{SyncError, ValidationError};

pub use session::{SetCompletion, WorkoutSession};

/// What kind of work an exercise is. Drives which exercises feed the
/// drill sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    #[default]
    Strength,
    BallHandling,
    Shooting,
    Core,
    Conditioning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    pub id: i64,
    pub set_number: u32,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Seconds actually rested before this set.
    #[serde(default)]
    pub rest_time_secs: Option<u64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: i64,
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub category: ExerciseCategory,
    #[serde(default)]
    pub notes: Option<String>,
    pub target_sets: u32,
    pub target_reps: String,
    pub sets: Vec<WorkoutSet>,
}

impl WorkoutExercise {
    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }
}

/// A workout as handed over by the record store when the user starts it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub workout_id: i64,
    pub name: String,
    pub exercises: Vec<WorkoutExercise>,
}

/// Identifies one set within the active workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRef {
    pub exercise_id: i64,
    pub set_id: i64,
}

/// Partial update to one set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetPatch {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub rpe: Option<f64>,
    pub rest_time_secs: Option<u64>,
    pub completed: Option<bool>,
}

/// The workout in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveWorkout {
    pub workout_id: i64,
    pub name: String,
    pub started_at_ms: u64,
    pub exercises: Vec<WorkoutExercise>,
    /// The most recently completed set; the running rest timer belongs to it.
    #[serde(default)]
    pub last_completed: Option<SetRef>,
}

impl ActiveWorkout {
    pub fn start(plan: WorkoutPlan, now_ms: u64) -> Result<Self, ValidationError> {
        if plan.exercises.is_empty() {
            return Err(ValidationError::EmptyCollection("exercises".into()));
        }
        let mut exercises = plan.exercises;
        exercises.sort_by_key(|e| e.order);
        Ok(Self {
            workout_id: plan.workout_id,
            name: plan.name,
            started_at_ms: now_ms,
            exercises,
            last_completed: None,
        })
    }

    pub fn exercise(&self, exercise_id: i64) -> Option<&WorkoutExercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }

    pub fn set(&self, at: SetRef) -> Option<&WorkoutSet> {
        self.exercise(at.exercise_id)?
            .sets
            .iter()
            .find(|s| s.id == at.set_id)
    }

    /// Like [`ActiveWorkout::set`], naming the missing record on failure.
    pub fn try_set(&self, at: SetRef) -> Result<&WorkoutSet, ValidationError> {
        self.exercise(at.exercise_id)
            .ok_or(ValidationError::NotFound {
                kind: "exercise",
                id: at.exercise_id,
            })?
            .sets
            .iter()
            .find(|s| s.id == at.set_id)
            .ok_or(ValidationError::NotFound {
                kind: "set",
                id: at.set_id,
            })
    }

    fn set_mut(&mut self, at: SetRef) -> Result<&mut WorkoutSet, ValidationError> {
        let exercise = self
            .exercises
            .iter_mut()
            .find(|e| e.id == at.exercise_id)
            .ok_or(ValidationError::NotFound {
                kind: "exercise",
                id: at.exercise_id,
            })?;
        exercise
            .sets
            .iter_mut()
            .find(|s| s.id == at.set_id)
            .ok_or(ValidationError::NotFound {
                kind: "set",
                id: at.set_id,
            })
    }

    pub fn update_set(&mut self, at: SetRef, patch: SetPatch) -> Result<(), ValidationError> {
        let set = self.set_mut(at)?;
        if let Some(reps) = patch.reps {
            set.reps = Some(reps);
        }
        if let Some(weight) = patch.weight {
            set.weight = Some(weight);
        }
        if let Some(rpe) = patch.rpe {
            set.rpe = Some(rpe);
        }
        if let Some(rest) = patch.rest_time_secs {
            set.rest_time_secs = Some(rest);
        }
        if let Some(completed) = patch.completed {
            set.completed = completed;
        }
        Ok(())
    }

    pub fn complete_set(&mut self, at: SetRef) -> Result<(), ValidationError> {
        self.set_mut(at)?.completed = true;
        Ok(())
    }

    /// Whole minutes since the workout started.
    pub fn duration_min(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 60_000
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.completed_sets()).sum()
    }

    /// One drill per ball-handling exercise, in workout order.
    pub fn ball_handling_drills(&self, drill_secs: u64) -> Vec<Drill> {
        self.exercises
            .iter()
            .filter(|e| e.category == ExerciseCategory::BallHandling)
            .map(|e| Drill::new(e.id, e.name.clone(), drill_secs))
            .collect()
    }
}

/// The body sent to the workout store for one completed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUpdate {
    pub id: i64,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
    #[serde(rename = "restTime", default, skip_serializing_if = "Option::is_none")]
    pub rest_time_secs: Option<u64>,
}

/// External workout record store.
pub trait WorkoutStore {
    fn update_sets(
        &self,
        workout_id: i64,
        exercise_id: i64,
        sets: &[SetUpdate],
    ) -> Result<(), SyncError>;
}


#[cfg(test)]
mod tests {
    use super::fixtures::plan;
    use super::*;

    #[test]
    fn start_orders_exercises() {
        let w = ActiveWorkout::start(plan(), 0).unwrap();
        let ids: Vec<_> = w.exercises.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(w.total_sets(), 5);
    }

    #[test]
    fn start_rejects_empty_plan() {
        let empty = WorkoutPlan {
            workout_id: 1,
            name: "Empty".into(),
            exercises: Vec::new(),
        };
        assert!(ActiveWorkout::start(empty, 0).is_err());
    }

    #[test]
    fn update_set_applies_patch() {
        let mut w = ActiveWorkout::start(plan(), 0).unwrap();
        let at = SetRef { exercise_id: 1, set_id: 11 };
        w.update_set(
            at,
            SetPatch {
                reps: Some(8),
                weight: Some(100.0),
                ..Default::default()
            },
        )
        .unwrap();
        let set = w.set(at).unwrap();
        assert_eq!(set.reps, Some(8));
        assert_eq!(set.weight, Some(100.0));
        assert!(!set.completed);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut w = ActiveWorkout::start(plan(), 0).unwrap();
        assert_eq!(
            w.complete_set(SetRef { exercise_id: 9, set_id: 1 }),
            Err(ValidationError::NotFound { kind: "exercise", id: 9 })
        );
        assert_eq!(
            w.complete_set(SetRef { exercise_id: 1, set_id: 99 }),
            Err(ValidationError::NotFound { kind: "set", id: 99 })
        );
    }

    #[test]
    fn duration_in_whole_minutes() {
        let w = ActiveWorkout::start(plan(), 1_000).unwrap();
        assert_eq!(w.duration_min(1_000 + 59_999), 0);
        assert_eq!(w.duration_min(1_000 + 125_000), 2);
    }

    #[test]
    fn drills_come_from_ball_handling_exercises() {
        let w = ActiveWorkout::start(plan(), 0).unwrap();
        let drills = w.ball_handling_drills(15);
        assert_eq!(
            drills,
            vec![Drill::new(2, "Pound Dribble", 15), Drill::new(3, "Crossovers", 15)]
        );
    }

    #[test]
    fn set_update_wire_format() {
        let update = SetUpdate {
            id: 7,
            reps: 10,
            weight: 60.0,
            completed: true,
            rest_time_secs: Some(30),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["restTime"], 30);
        assert_eq!(json["completed"], true);

        let without_rest = SetUpdate {
            rest_time_secs: None,
            ..update
        };
        let json = serde_json::to_value(&without_rest).unwrap();
        assert!(json.get("restTime").is_none());
    }
}
