//! TOML-based application configuration.
//!
//! Stores timer durations and goal settings at
//! `~/.config/circ/config.toml`. Every field carries a serde default so
//! partial files and older versions load cleanly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};

/// Timer duration configuration, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

/// Goal thresholds driving credits, ranks and shields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_daily_goal_minutes")]
    pub daily_goal_minutes: u32,
    #[serde(default = "default_hourly_goal_minutes")]
    pub hourly_goal_minutes: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/circ/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_work_minutes() -> u32 {
    30
}
fn default_break_minutes() -> u32 {
    30
}
fn default_daily_goal_minutes() -> u32 {
    480
}
fn default_hourly_goal_minutes() -> u32 {
    30
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            daily_goal_minutes: default_daily_goal_minutes(),
            hourly_goal_minutes: default_hourly_goal_minutes(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    fn load_from(path: &std::path::Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg = toml::from_str(&content).map_err(|e| {
                    CoreError::Config(ConfigError::ParseFailed(e.to_string()))
                })?;
                Ok(cfg)
            }
            // A missing file is first run; anything else is a real error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Config(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })),
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            CoreError::Config(ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;
        std::fs::write(path, content).map_err(|e| {
            CoreError::Config(ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, keeping the existing
    /// value's type.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value cannot be
    /// parsed as the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        Ok(())
    }
}

fn set_json_value_by_path(
    root: &mut serde_json::Value,
    key: &str,
    value: &str,
) -> Result<()> {
    let invalid = |message: String| {
        CoreError::Config(ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })
    };

    let mut parts = key.split('.').peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        let is_leaf = parts.peek().is_none();
        let obj = current
            .as_object_mut()
            .ok_or_else(|| invalid("unknown config key".into()))?;
        let slot = obj
            .get_mut(part)
            .ok_or_else(|| invalid("unknown config key".into()))?;
        if is_leaf {
            *slot = match slot {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|e| invalid(e.to_string()))?
                        .into(),
                ),
                serde_json::Value::String(_) => serde_json::Value::String(value.to_string()),
                _ => return Err(invalid("unsupported value type".into())),
            };
            return Ok(());
        }
        current = slot;
    }
    Err(invalid("config key is empty".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.work_minutes, 30);
        assert_eq!(parsed.goals.daily_goal_minutes, 480);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn partial_file_falls_back_to_field_defaults() {
        let parsed: Config = toml::from_str("[timer]\nwork_minutes = 45\n").unwrap();
        assert_eq!(parsed.timer.work_minutes, 45);
        assert_eq!(parsed.timer.break_minutes, 30);
        assert_eq!(parsed.goals.daily_goal_minutes, 480);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.work_minutes").as_deref(), Some("30"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("timer.work_minutes", "50").unwrap();
        assert_eq!(cfg.timer.work_minutes, 50);
        cfg.set("notifications.enabled", "false").unwrap();
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn missing_file_writes_defaults_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.timer.work_minutes, 30);
        assert!(path.exists());
    }

    #[test]
    fn unreadable_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        // A directory at the config path fails to read with something
        // other than NotFound.
        std::fs::create_dir(&path).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.unknown", "1").is_err());
        assert!(cfg.set("timer.work_minutes", "soon").is_err());
    }
}
