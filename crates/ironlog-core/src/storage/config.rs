//! User settings, kept as TOML in the data directory (`config.toml`).
//!
//! Every field has a serde default, so a partial or older file still loads.
//! Settings are addressed by dotted keys such as `timer.tick_interval_ms`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::drill::DEFAULT_DRILL_SECS;
use crate::error::ConfigError;
use crate::presets::FALLBACK_REST_SECS;
use crate::timer::validate_duration;

/// Rest timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Used by `rest start` without an explicit duration.
    #[serde(default = "default_rest_secs")]
    pub default_duration_secs: u64,
    /// Preset (in display order) auto-started after a completed set.
    #[serde(default = "default_preset_index")]
    pub preset_index: usize,
}

/// Drill sequence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillConfig {
    #[serde(default = "default_drill_secs")]
    pub duration_secs: u64,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell at each phase end.
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_50")]
    pub volume: u32,
}

/// Poll loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/ironlog/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub drills: DrillConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

fn default_rest_secs() -> u64 {
    FALLBACK_REST_SECS
}
fn default_preset_index() -> usize {
    2
}
fn default_drill_secs() -> u64 {
    DEFAULT_DRILL_SECS
}
fn default_true() -> bool {
    true
}
fn default_50() -> u32 {
    50
}
fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            default_duration_secs: default_rest_secs(),
            preset_index: default_preset_index(),
        }
    }
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_drill_secs(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sound: default_true(),
            volume: default_50(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// `rest.preset_index` -> `/rest/preset_index`
fn json_pointer(key: &str) -> Option<String> {
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return None;
    }
    Some(format!("/{}", key.replace('.', "/")))
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config first if there is none.
    ///
    /// # Errors
    ///
    /// Fails if an existing file does not parse or validate, or if the
    /// default cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let cfg = Self::default();
            cfg.save_to(path)?;
            return Ok(cfg);
        }
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let cfg: Config = toml::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Read one setting by dotted key, e.g. `rest.default_duration_secs`.
    /// Section keys (`rest`) have no single value and return `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        let tree = serde_json::to_value(self).ok()?;
        match tree.pointer(&json_pointer(key)?)? {
            serde_json::Value::Object(_) => None,
            serde_json::Value::String(s) => Some(s.clone()),
            leaf => Some(leaf.to_string()),
        }
    }

    /// Change one setting by dotted key without saving.
    ///
    /// The new value is parsed as the type the setting already has, then
    /// the whole config is revalidated. On error `self` is unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut tree = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let leaf = json_pointer(key)
            .and_then(|ptr| tree.pointer_mut(&ptr))
            .filter(|leaf| !leaf.is_object())
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let parsed = match &*leaf {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?,
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(serde_json::Value::from)
                .map_err(|_| invalid(format!("expected a whole number, got '{value}'")))?,
            _ => serde_json::Value::String(value.to_string()),
        };
        *leaf = parsed;

        let updated: Config = serde_json::from_value(tree).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// [`Config::set_value`], then save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Range checks serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        validate_duration(self.rest.default_duration_secs)
            .map_err(|e| out_of_range("rest.default_duration_secs", e.to_string()))?;
        if self.drills.duration_secs == 0 {
            return Err(out_of_range("drills.duration_secs", "must be greater than zero".into()));
        }
        if !(10..=1000).contains(&self.timer.tick_interval_ms) {
            return Err(out_of_range("timer.tick_interval_ms", "must be between 10 and 1000".into()));
        }
        if self.notifications.volume > 100 {
            return Err(out_of_range("notifications.volume", "must be at most 100".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.rest.default_duration_secs, 90);
        assert_eq!(parsed.notifications.volume, 50);
        assert_eq!(parsed.timer.tick_interval_ms, 100);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(indoc::indoc! {"
            [rest]
            default_duration_secs = 120

            [notifications]
            sound = false
        "})
        .unwrap();
        assert_eq!(cfg.rest.default_duration_secs, 120);
        assert_eq!(cfg.rest.preset_index, 2);
        assert!(!cfg.notifications.sound);
        assert!(cfg.notifications.enabled);
        assert_eq!(cfg.drills.duration_secs, 15);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.sound").as_deref(), Some("true"));
        assert_eq!(cfg.get("drills.duration_secs").as_deref(), Some("15"));
        assert!(cfg.get("rest.missing_key").is_none());
        assert!(cfg.get("").is_none());
        assert!(cfg.get("rest").is_none());
    }

    #[test]
    fn set_value_updates_nested_fields() {
        let mut cfg = Config::default();
        cfg.set_value("notifications.enabled", "false").unwrap();
        cfg.set_value("rest.default_duration_secs", "120").unwrap();
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.rest.default_duration_secs, 120);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("rest.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("notifications.sound", "loud").is_err());
        assert!(cfg.set_value("drills.duration_secs", "-3").is_err());
    }

    #[test]
    fn set_value_rejects_out_of_range_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("rest.default_duration_secs", "0").is_err());
        assert!(cfg.set_value("timer.tick_interval_ms", "5000").is_err());
        assert_eq!(cfg.rest.default_duration_secs, 90);
        assert_eq!(cfg.timer.tick_interval_ms, 100);
    }

    #[test]
    fn load_from_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.drills.duration_secs, 15);
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set_value("drills.duration_secs", "20").unwrap();
        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.drills.duration_secs, 20);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer]\ntick_interval_ms = 1\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
