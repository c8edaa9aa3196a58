mod config;
pub mod database;

pub use config::{Config, DrillConfig, NotificationsConfig, RestConfig, TimerConfig};
pub use database::{Database, SetLogRecord};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/ironlog[-dev]/` based on IRONLOG_ENV.
///
/// Set IRONLOG_ENV=dev to use the development data directory, or
/// IRONLOG_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("IRONLOG_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("IRONLOG_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ironlog-dev")
            } else {
                base_dir.join("ironlog")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
