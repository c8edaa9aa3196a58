//! Set completion: rest-time capture, optimistic local update, store sync,
//! and the automatic rest timer.

use tracing::warn;

use super::{ActiveWorkout, SetPatch, SetRef, SetUpdate, WorkoutStore};
use crate::clock::Clock;
use crate::error::ValidationError;
use crate::events::Event;
use crate::timer::RestTimer;

/// Outcome of completing one set.
#[derive(Debug, Clone)]
pub struct SetCompletion {
    /// What was sent to the store.
    pub update: SetUpdate,
    /// The rest timer started for the next set, if any.
    pub rest_event: Option<Event>,
    /// Non-blocking notice when the store rejected or missed the update.
    /// Local state stays completed either way.
    pub sync_error: Option<String>,
}

/// Borrowing view over the active workout and its rest timer.
pub struct WorkoutSession<'a, C: Clock> {
    workout: &'a mut ActiveWorkout,
    timer: &'a mut RestTimer<C>,
}

impl<'a, C: Clock> WorkoutSession<'a, C> {
    pub fn new(workout: &'a mut ActiveWorkout, timer: &'a mut RestTimer<C>) -> Self {
        Self { workout, timer }
    }

    pub fn workout(&self) -> &ActiveWorkout {
        self.workout
    }

    pub fn timer(&self) -> &RestTimer<C> {
        self.timer
    }

    /// Seconds rested since the last completed set, if the active timer is
    /// still the one started for that set.
    pub fn rest_before_next_set(&self) -> Option<u64> {
        let last = self.workout.last_completed?;
        if self.timer.target_set_id() != Some(last.set_id) {
            return None;
        }
        self.timer.rest_time_secs()
    }

    /// Mark a set complete and start resting for `next_rest_secs`.
    ///
    /// The store is called after the local update; its failure is logged
    /// and reported in the result but never undoes local or timer state.
    pub fn complete_set(
        &mut self,
        store: &dyn WorkoutStore,
        at: SetRef,
        reps: u32,
        weight: f64,
        next_rest_secs: u64,
    ) -> Result<SetCompletion, ValidationError> {
        self.workout.try_set(at)?;
        let rest_time_secs = self.rest_before_next_set();
        let mut completion = self.record_completion(store, at, reps, weight, rest_time_secs)?;
        completion.rest_event = self
            .timer
            .start(next_rest_secs, Some(at.exercise_id), Some(at.set_id));
        self.workout.last_completed = Some(at);
        Ok(completion)
    }

    /// Mark every open set of the given drill exercises done (1 rep, no
    /// weight) once a drill sequence is acknowledged. The rest timer is
    /// left alone.
    pub fn complete_drill_sets(
        &mut self,
        store: &dyn WorkoutStore,
        drill_ids: &[i64],
    ) -> Result<Vec<SetCompletion>, ValidationError> {
        let open: Vec<SetRef> = self
            .workout
            .exercises
            .iter()
            .filter(|e| drill_ids.contains(&e.id))
            .flat_map(|e| {
                e.sets.iter().filter(|s| !s.completed).map(move |s| SetRef {
                    exercise_id: e.id,
                    set_id: s.id,
                })
            })
            .collect();

        open.into_iter()
            .map(|at| self.record_completion(store, at, 1, 0.0, None))
            .collect()
    }

    fn record_completion(
        &mut self,
        store: &dyn WorkoutStore,
        at: SetRef,
        reps: u32,
        weight: f64,
        rest_time_secs: Option<u64>,
    ) -> Result<SetCompletion, ValidationError> {
        self.workout.update_set(
            at,
            SetPatch {
                reps: Some(reps),
                weight: Some(weight),
                rest_time_secs,
                completed: Some(true),
                ..Default::default()
            },
        )?;

        let update = SetUpdate {
            id: at.set_id,
            reps,
            weight,
            completed: true,
            rest_time_secs,
        };
        let sync_error = match store.update_sets(
            self.workout.workout_id,
            at.exercise_id,
            std::slice::from_ref(&update),
        ) {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    workout_id = self.workout.workout_id,
                    exercise_id = at.exercise_id,
                    set_id = at.set_id,
                    error = %e,
                    "set update failed to sync; keeping local completion"
                );
                Some(e.to_string())
            }
        };

        Ok(SetCompletion {
            update,
            rest_event: None,
            sync_error,
        })
    }
}
