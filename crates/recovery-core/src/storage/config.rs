//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The local user id plans are recorded under
//! - Defaults for new plans (duration, reminder time)
//! - Reminder cadence and whether to ask for system notifications
//! - Thresholds that select end-of-plan coaching suggestions
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::analytics::SuggestionPolicy;
use crate::calendar::ClockTime;
use crate::error::ConfigError;

/// Identity used for locally recorded plans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

/// Defaults applied when starting a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlansConfig {
    #[serde(default = "default_reminder_time")]
    pub default_reminder_time: String,
    #[serde(default = "default_duration_days")]
    pub default_duration_days: u32,
}

/// Reminder scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Seconds between ticks when watching (1..=60).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Request system notification permission when arming.
    #[serde(default = "default_true")]
    pub notifications: bool,
}

/// Coaching thresholds on the final success rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_low_threshold")]
    pub low_threshold: u32,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub plans: PlansConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_user_id() -> String {
    "local".into()
}
fn default_reminder_time() -> String {
    "09:00".into()
}
fn default_duration_days() -> u32 {
    30
}
fn default_tick_interval() -> u64 {
    60
}
fn default_true() -> bool {
    true
}
fn default_low_threshold() -> u32 {
    50
}
fn default_high_threshold() -> u32 {
    80
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

impl Default for PlansConfig {
    fn default() -> Self {
        Self {
            default_reminder_time: default_reminder_time(),
            default_duration_days: default_duration_days(),
        }
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval(),
            notifications: true,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            low_threshold: default_low_threshold(),
            high_threshold: default_high_threshold(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk, writing defaults if no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// or validate. On error `self` is left unchanged.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Config::apply`] fails or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "user.id".into(),
                message: "must not be empty".into(),
            });
        }
        ClockTime::parse(&self.plans.default_reminder_time).map_err(|e| {
            ConfigError::InvalidValue {
                key: "plans.default_reminder_time".into(),
                message: e.to_string(),
            }
        })?;
        if self.plans.default_duration_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "plans.default_duration_days".into(),
                message: "must be at least 1".into(),
            });
        }
        if !(1..=60).contains(&self.reminder.tick_interval_secs) {
            return Err(ConfigError::InvalidValue {
                key: "reminder.tick_interval_secs".into(),
                message: "must be between 1 and 60 seconds".into(),
            });
        }
        if self.analytics.low_threshold > self.analytics.high_threshold
            || self.analytics.high_threshold > 100
        {
            return Err(ConfigError::InvalidValue {
                key: "analytics".into(),
                message: "expected low_threshold <= high_threshold <= 100".into(),
            });
        }
        Ok(())
    }

    /// Parsed default reminder time (falls back to 09:00 if invalid).
    pub fn default_reminder_time(&self) -> ClockTime {
        ClockTime::parse(&self.plans.default_reminder_time).unwrap_or(ClockTime::DEFAULT_REMINDER)
    }

    pub fn suggestion_policy(&self) -> SuggestionPolicy {
        SuggestionPolicy {
            low_threshold: self.analytics.low_threshold,
            high_threshold: self.analytics.high_threshold,
        }
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
        assert_eq!(parsed.user.id, "local");
        assert_eq!(parsed.reminder.tick_interval_secs, 60);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn missing_sections_use_defaults() {
        let parsed: Config = toml::from_str("[plans]\ndefault_duration_days = 14\n").unwrap();
        assert_eq!(parsed.plans.default_duration_days, 14);
        assert_eq!(parsed.plans.default_reminder_time, "09:00");
        assert_eq!(parsed.analytics.high_threshold, 80);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("plans.default_reminder_time").as_deref(), Some("09:00"));
        assert_eq!(cfg.get("reminder.tick_interval_secs").as_deref(), Some("60"));
        assert_eq!(cfg.get("reminder.notifications").as_deref(), Some("true"));
        assert!(cfg.get("plans.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.apply("reminder.notifications", "false").unwrap();
        cfg.apply("analytics.low_threshold", "40").unwrap();
        cfg.apply("plans.default_reminder_time", "21:15").unwrap();
        assert!(!cfg.reminder.notifications);
        assert_eq!(cfg.analytics.low_threshold, 40);
        assert_eq!(cfg.default_reminder_time().to_string(), "21:15");
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("plans.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.apply("reminder", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_values_and_keeps_state() {
        let mut cfg = Config::default();
        assert!(cfg.apply("reminder.notifications", "sometimes").is_err());
        assert!(cfg.apply("reminder.tick_interval_secs", "120").is_err());
        assert!(cfg.apply("plans.default_reminder_time", "9am").is_err());
        assert!(cfg.apply("analytics.low_threshold", "90").is_err());
        assert_eq!(cfg.reminder.tick_interval_secs, 60);
        assert_eq!(cfg.plans.default_reminder_time, "09:00");
        assert_eq!(cfg.analytics.low_threshold, 50);
    }

    #[test]
    fn suggestion_policy_mirrors_thresholds() {
        let mut cfg = Config::default();
        cfg.apply("analytics.high_threshold", "90").unwrap();
        let policy = cfg.suggestion_policy();
        assert_eq!(policy.low_threshold, 50);
        assert_eq!(policy.high_threshold, 90);
    }
}
