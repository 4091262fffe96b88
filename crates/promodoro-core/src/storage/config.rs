//! TOML-based application configuration.
//!
//! Stores local settings:
//! - Server API base URL
//! - Fallback phase durations, used when the server preference fetch fails
//! - Notification behavior
//! - Scheduler tick period
//!
//! Configuration is stored at `~/.config/promodoro/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::preferences::Preferences;

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Fallback phase durations, in seconds. The server-side preferences take
/// precedence whenever they can be fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u64,
    #[serde(default = "default_short_break_secs")]
    pub short_break_secs: u64,
    #[serde(default = "default_long_break_secs")]
    pub long_break_secs: u64,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell on phase completion.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/promodoro/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Tick loop period in milliseconds. Coarse on purpose: remaining time
    /// is derived from the wall clock, so tick precision only bounds how
    /// late a completion can fire, not how accurate the countdown is.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".into()
}
fn default_focus_secs() -> u64 {
    25 * 60
}
fn default_short_break_secs() -> u64 {
    5 * 60
}
fn default_long_break_secs() -> u64 {
    15 * 60
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_tick_interval_ms() -> u64 {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            focus_secs: default_focus_secs(),
            short_break_secs: default_short_break_secs(),
            long_break_secs: default_long_break_secs(),
            sessions_until_long_break: default_sessions_until_long_break(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            schedule: ScheduleConfig::default(),
            notifications: NotificationsConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/promodoro"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
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
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// The local fallback when the server preference fetch fails.
    pub fn fallback_preferences(&self) -> Preferences {
        Preferences {
            focus_secs: self.schedule.focus_secs,
            short_break_secs: self.schedule.short_break_secs,
            long_break_secs: self.schedule.long_break_secs,
            sessions_until_long_break: self.schedule.sessions_until_long_break,
        }
        .normalized()
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = lookup(&json, key)?;
        match value {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// as the existing value's type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let slot = lookup_mut(&mut json, key).ok_or_else(|| {
            ConfigError::UnknownKey(key.to_string())
        })?;
        *slot = parse_as(slot, value).map_err(|message| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        })?;

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

fn lookup<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn lookup_mut<'a>(
    root: &'a mut serde_json::Value,
    key: &str,
) -> Option<&'a mut serde_json::Value> {
    if key.is_empty() {
        return None;
    }
    let mut current = root;
    for part in key.split('.') {
        current = current.get_mut(part)?;
    }
    Some(current)
}

/// Parse `value` into the same JSON type as `existing`.
fn parse_as(existing: &serde_json::Value, value: &str) -> Result<serde_json::Value, String> {
    match existing {
        serde_json::Value::Bool(_) => value
            .parse::<bool>()
            .map(serde_json::Value::Bool)
            .map_err(|_| format!("cannot parse '{value}' as bool")),
        serde_json::Value::Number(_) => value
            .parse::<u64>()
            .map(|n| serde_json::Value::Number(n.into()))
            .map_err(|_| format!("cannot parse '{value}' as number")),
        serde_json::Value::String(_) => Ok(serde_json::Value::String(value.to_string())),
        _ => Err("key does not hold a settable value".to_string()),
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
        assert_eq!(parsed.api.base_url, "http://localhost:3000");
        assert_eq!(parsed.schedule.focus_secs, 1500);
        assert_eq!(parsed.tick_interval_ms, 500);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("schedule.focus_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("notifications.bell").as_deref(), Some("true"));
        assert_eq!(
            cfg.get("api.base_url").as_deref(),
            Some("http://localhost:3000")
        );
        assert!(cfg.get("api.missing").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn parse_as_respects_existing_type() {
        let bool_slot = serde_json::Value::Bool(true);
        assert_eq!(
            parse_as(&bool_slot, "false").unwrap(),
            serde_json::Value::Bool(false)
        );
        assert!(parse_as(&bool_slot, "maybe").is_err());

        let num_slot = serde_json::Value::Number(5.into());
        assert_eq!(
            parse_as(&num_slot, "900").unwrap(),
            serde_json::Value::Number(900.into())
        );
        assert!(parse_as(&num_slot, "soon").is_err());
    }

    #[test]
    fn fallback_preferences_mirror_schedule_section() {
        let mut cfg = Config::default();
        cfg.schedule.focus_secs = 3000;
        cfg.schedule.sessions_until_long_break = 0;
        let prefs = cfg.fallback_preferences();
        assert_eq!(prefs.focus_secs, 3000);
        // Zero cadence is clamped, never passed to the engine.
        assert_eq!(prefs.sessions_until_long_break, 1);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[api]\nbase_url = \"http://promo.example\"\n").unwrap();
        assert_eq!(parsed.api.base_url, "http://promo.example");
        assert_eq!(parsed.schedule.short_break_secs, 300);
        assert!(parsed.notifications.enabled);
    }
}
