//! Error types for ironlog-core.
//!
//! Timer and sequencer commands never fail; a redundant command is a no-op.
//! Errors only come from construction input, the local database, the config
//! file, and the workout store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("storage: {0}")]
    Database(#[from] DatabaseError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("workout sync: {0}")]
    Sync(#[from] SyncError),

    /// Stored state could not be encoded.
    #[error("state encoding: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from the local SQLite database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot open database {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database query failed: {0}")]
    QueryFailed(String),

    /// Another process holds the database; retrying later may succeed.
    #[error("database is busy or locked by another process")]
    Locked,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("data directory unavailable: {0}")]
    DataDir(String),

    #[error("cannot read config {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("cannot write config {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("bad value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("no config key named '{0}'")]
    UnknownKey(String),
}

/// Rejected construction or command input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no {0} given")]
    EmptyCollection(String),

    #[error("bad {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
}

/// Failure reported by a [`crate::WorkoutStore`]. Never rolls back local state.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("workout {workout_id} update rejected: {message}")]
    Rejected { workout_id: i64, message: String },

    #[error("workout store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked) => {
                DatabaseError::Locked
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<DatabaseError> for SyncError {
    fn from(err: DatabaseError) -> Self {
        SyncError::Unavailable(err.to_string())
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
