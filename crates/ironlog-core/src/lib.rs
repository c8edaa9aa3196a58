//! # ironlog Core Library
//!
//! Core logic for the ironlog workout tracker: the rest timer shown between
//! sets, the auto-advancing drill sequencer, and the bridge that records
//! completed sets. The CLI is a thin host over this crate.
//!
//! ## Architecture
//!
//! - **Rest Timer** and **Drill Sequencer**: wall-clock-based state machines
//!   that require the caller to periodically invoke `tick()`. Both compute
//!   remaining time from an absolute end instant taken from an injected
//!   [`Clock`].
//! - **Events**: every command and phase end yields an [`Event`]; hosts feed
//!   them to a [`notify::Notifier`] for sound and notifications.
//! - **Workout**: the active workout and [`WorkoutSession`], which captures
//!   rest time and syncs [`SetUpdate`]s through a [`WorkoutStore`].
//! - **Storage**: SQLite-backed local state and TOML configuration.

pub mod clock;
pub mod drill;
pub mod error;
pub mod events;
pub mod notify;
pub mod presets;
pub mod storage;
pub mod timer;
pub mod workout;

pub use clock::{Clock, ManualClock, SystemClock};
pub use drill::{Drill, DrillSequencer, SequencePhase};
pub use error::{ConfigError, CoreError, DatabaseError, SyncError, ValidationError};
pub use events::Event;
pub use presets::RestPreset;
pub use storage::{Config, Database};
pub use timer::{RestTimer, TimerState};
pub use workout::{
    ActiveWorkout, ExerciseCategory, SetRef, SetUpdate, WorkoutPlan, WorkoutSession, WorkoutStore,
};
