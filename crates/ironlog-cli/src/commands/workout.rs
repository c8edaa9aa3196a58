use std::path::PathBuf;

use clap::Subcommand;
use ironlog_core::presets::pick_rest_secs;
use ironlog_core::storage::Database;
use ironlog_core::timer::validate_duration;
use ironlog_core::{ActiveWorkout, Clock, Config, SetRef, SystemClock, WorkoutPlan, WorkoutSession};
use serde_json::json;

use super::{
    emit, load_rest_timer, load_workout, print_json, CmdResult, ACTIVE_WORKOUT_KEY,
    REST_TIMER_KEY,
};
use crate::notifier::TerminalNotifier;

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Start a workout from a JSON plan
    Load {
        /// Path to the workout plan
        file: PathBuf,
    },
    /// Print the active workout as JSON
    Show,
    /// Complete a set and start resting
    Done {
        /// Exercise id
        exercise: i64,
        /// Set id
        set: i64,
        #[arg(long)]
        reps: u32,
        #[arg(long, default_value = "0")]
        weight: f64,
        /// Rest before the next set [default: the configured preset]
        #[arg(long)]
        rest: Option<u64>,
    },
    /// End the active workout
    Finish,
}

pub fn run(action: WorkoutAction) -> CmdResult {
    let db = Database::open()?;

    match action {
        WorkoutAction::Load { file } => {
            if load_workout(&db)?.is_some() {
                return Err("a workout is already active; run `ironlog workout finish` first".into());
            }
            let content = std::fs::read_to_string(&file)
                .map_err(|e| format!("cannot read {}: {e}", file.display()))?;
            let plan: WorkoutPlan = serde_json::from_str(&content)?;
            let workout = ActiveWorkout::start(plan, SystemClock.now_ms())?;
            tracing::info!(workout_id = workout.workout_id, "workout started");
            db.save_json(ACTIVE_WORKOUT_KEY, &workout)?;
            print_json(&summary(&workout))?;
        }
        WorkoutAction::Show => {
            let workout = require_workout(&db)?;
            print_json(&workout)?;
        }
        WorkoutAction::Done { exercise, set, reps, weight, rest } => {
            let config = Config::load()?;
            let mut workout = require_workout(&db)?;
            let mut timer = load_rest_timer(&db)?;
            let mut notifier = TerminalNotifier::from_config(&config.notifications);

            let completed: Vec<_> = timer.tick().into_iter().collect();
            emit(&completed, &mut notifier)?;

            let rest_secs = match rest {
                Some(secs) => validate_duration(secs)?,
                None => pick_rest_secs(&db.rest_presets()?, config.rest.preset_index),
            };
            let at = SetRef { exercise_id: exercise, set_id: set };
            let completion =
                WorkoutSession::new(&mut workout, &mut timer).complete_set(&db, at, reps, weight, rest_secs)?;

            if let Some(message) = &completion.sync_error {
                eprintln!("warning: set saved locally but not synced: {message}");
            }
            print_json(&completion.update)?;
            if let Some(event) = &completion.rest_event {
                print_json(event)?;
            }
            db.save_json(ACTIVE_WORKOUT_KEY, &workout)?;
            db.save_json(REST_TIMER_KEY, &timer)?;
        }
        WorkoutAction::Finish => {
            let workout = require_workout(&db)?;
            let mut timer = load_rest_timer(&db)?;
            timer.stop();

            let mut report = summary(&workout);
            report["average_rest_secs"] = json!(db.average_rest_secs(workout.workout_id)?);
            print_json(&report)?;

            db.kv_delete(ACTIVE_WORKOUT_KEY)?;
            db.save_json(REST_TIMER_KEY, &timer)?;
        }
    }
    Ok(())
}

fn require_workout(db: &Database) -> Result<ActiveWorkout, Box<dyn std::error::Error>> {
    Ok(load_workout(db)?.ok_or("no active workout; load one with `ironlog workout load`")?)
}

fn summary(workout: &ActiveWorkout) -> serde_json::Value {
    json!({
        "workout_id": workout.workout_id,
        "name": workout.name,
        "duration_min": workout.duration_min(SystemClock.now_ms()),
        "completed_sets": workout.completed_sets(),
        "total_sets": workout.total_sets(),
    })
}
