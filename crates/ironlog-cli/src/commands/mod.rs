pub mod config;
pub mod drill;
pub mod preset;
pub mod rest;
pub mod workout;

use ironlog_core::notify::{dispatch, Notifier};
use ironlog_core::storage::Database;
use ironlog_core::{ActiveWorkout, DatabaseError, Event, RestTimer};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub const REST_TIMER_KEY: &str = "rest_timer";
pub const DRILL_RUN_KEY: &str = "drill_run";
pub const ACTIVE_WORKOUT_KEY: &str = "active_workout";

pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print each event and fire its cue or notice.
pub fn emit(events: &[Event], notifier: &mut dyn Notifier) -> Result<(), serde_json::Error> {
    for event in events {
        print_json(event)?;
        dispatch(&mut *notifier, event);
    }
    Ok(())
}

pub fn load_rest_timer(db: &Database) -> Result<RestTimer, DatabaseError> {
    Ok(db.load_json(REST_TIMER_KEY)?.unwrap_or_default())
}

pub fn load_workout(db: &Database) -> Result<Option<ActiveWorkout>, DatabaseError> {
    db.load_json(ACTIVE_WORKOUT_KEY)
}
