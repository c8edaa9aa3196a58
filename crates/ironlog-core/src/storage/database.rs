//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Key-value store for timer, sequencer, and active workout state
//! - Completed set updates (the local [`WorkoutStore`])
//! - Rest timer presets

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::data_dir;
use crate::error::{CoreError, DatabaseError, SyncError};
use crate::presets::{default_presets, RestPreset};
use crate::workout::{SetUpdate, WorkoutStore};

/// One row of the set log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLogRecord {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_id: i64,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
    pub rest_time_secs: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite database for local state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/ironlog/ironlog.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("ironlog.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        // `watch` reads while other invocations write.
        conn.busy_timeout(Duration::from_secs(2))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS set_log (
                set_id         INTEGER PRIMARY KEY,
                workout_id     INTEGER NOT NULL,
                exercise_id    INTEGER NOT NULL,
                reps           INTEGER NOT NULL,
                weight         REAL NOT NULL,
                completed      INTEGER NOT NULL,
                rest_time_secs INTEGER,
                updated_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS rest_presets (
                id            INTEGER PRIMARY KEY,
                name          TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                sort_order    INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_set_log_workout ON set_log(workout_id, exercise_id);",
        )?;

        let preset_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM rest_presets", [], |row| row.get(0))?;
        if preset_count == 0 {
            for preset in default_presets() {
                self.conn.execute(
                    "INSERT INTO rest_presets (id, name, duration_secs, sort_order)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![preset.id, preset.name, preset.duration_secs, preset.order],
                )?;
            }
        }
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Load a JSON value from the kv store.
    ///
    /// A value that no longer parses (e.g. saved by an older build) is
    /// treated as absent.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let Some(json) = self.kv_get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable stored state");
                Ok(None)
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)?;
        Ok(self.kv_set(key, &json)?)
    }

    pub fn rest_presets(&self) -> Result<Vec<RestPreset>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, duration_secs, sort_order FROM rest_presets ORDER BY sort_order",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RestPreset {
                id: row.get(0)?,
                name: row.get(1)?,
                duration_secs: row.get(2)?,
                order: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Record set updates, replacing any earlier row for the same set.
    pub fn record_sets(
        &self,
        workout_id: i64,
        exercise_id: i64,
        sets: &[SetUpdate],
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        for set in sets {
            self.conn.execute(
                "INSERT OR REPLACE INTO set_log
                    (set_id, workout_id, exercise_id, reps, weight, completed, rest_time_secs, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    set.id,
                    workout_id,
                    exercise_id,
                    set.reps,
                    set.weight,
                    set.completed,
                    set.rest_time_secs,
                    now,
                ],
            )?;
        }
        Ok(())
    }

    pub fn set_log(&self, workout_id: i64) -> Result<Vec<SetLogRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT workout_id, exercise_id, set_id, reps, weight, completed, rest_time_secs, updated_at
             FROM set_log WHERE workout_id = ?1 ORDER BY exercise_id, set_id",
        )?;
        let rows = stmt.query_map(params![workout_id], |row| {
            let updated_at: String = row.get(7)?;
            Ok(SetLogRecord {
                workout_id: row.get(0)?,
                exercise_id: row.get(1)?,
                set_id: row.get(2)?,
                reps: row.get(3)?,
                weight: row.get(4)?,
                completed: row.get(5)?,
                rest_time_secs: row.get(6)?,
                updated_at: DateTime::parse_from_rfc3339(&updated_at)
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Average recorded rest for a workout, ignoring sets without one.
    pub fn average_rest_secs(&self, workout_id: i64) -> Result<Option<f64>, DatabaseError> {
        Ok(self.conn.query_row(
            "SELECT AVG(rest_time_secs) FROM set_log
             WHERE workout_id = ?1 AND rest_time_secs IS NOT NULL",
            params![workout_id],
            |row| row.get::<_, Option<f64>>(0),
        )?)
    }
}

impl WorkoutStore for Database {
    fn update_sets(
        &self,
        workout_id: i64,
        exercise_id: i64,
        sets: &[SetUpdate],
    ) -> Result<(), SyncError> {
        Ok(self.record_sets(workout_id, exercise_id, sets)?)
    }
}
