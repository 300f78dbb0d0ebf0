//! TOML-based application configuration.
//!
//! Stores:
//! - Challenge window (length, start date, calendar-day offset)
//! - XP amounts per reward kind
//! - Remote ledger backend selection
//! - The signed-in actor used by the CLI
//!
//! Configuration is stored at `~/.config/dayquest/config.toml`.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::rewards::XpKind;

/// Challenge window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeConfig {
    #[serde(default = "default_length_days")]
    pub length_days: u32,
    /// First calendar day of the challenge (day 1).
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Offset from UTC used to decide which calendar day "today" is.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

/// XP granted per reward kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    #[serde(default = "default_10")]
    pub day_complete: i64,
    #[serde(default = "default_25")]
    pub weekly_retro: i64,
    #[serde(default = "default_5")]
    pub mood_checkin: i64,
    #[serde(default = "default_5")]
    pub tiny_habit: i64,
    #[serde(default = "default_10")]
    pub focus_session: i64,
    #[serde(default = "default_5")]
    pub flashcards_practice: i64,
    #[serde(default = "default_5")]
    pub task_complete: i64,
}

/// Which ledger implementation the CLI talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    /// Local SQLite file standing in for the remote ledger.
    #[default]
    Sqlite,
    /// PostgREST-compatible HTTP endpoint.
    Rest,
}

/// Remote ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: LedgerBackend,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/dayquest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Signed-in actor. Remote calls are refused while unset.
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn default_length_days() -> u32 {
    30
}
fn default_5() -> i64 {
    5
}
fn default_10() -> i64 {
    10
}
fn default_25() -> i64 {
    25
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            length_days: default_length_days(),
            start_date: None,
            utc_offset_hours: 0,
        }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            day_complete: 10,
            weekly_retro: 25,
            mood_checkin: 5,
            tiny_habit: 5,
            focus_session: 10,
            flashcards_practice: 5,
            task_complete: 5,
        }
    }
}

impl RewardsConfig {
    /// XP granted for one event of `kind`.
    pub fn amount_for(&self, kind: XpKind) -> i64 {
        match kind {
            XpKind::DayComplete => self.day_complete,
            XpKind::WeeklyRetro => self.weekly_retro,
            XpKind::MoodCheckin => self.mood_checkin,
            XpKind::TinyHabit => self.tiny_habit,
            XpKind::FocusSession => self.focus_session,
            XpKind::FlashcardsPractice => self.flashcards_practice,
            XpKind::TaskComplete => self.task_complete,
        }
    }
}

impl ChallengeConfig {
    /// The actor's local calendar date right now.
    pub fn local_today(&self) -> NaiveDate {
        let offset = FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        Utc::now().with_timezone(&offset).date_naive()
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
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
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
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<i64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?;
                        serde_json::Value::Number(n.into())
                    }
                    _ if value.is_empty() || value == "none" => serde_json::Value::Null,
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
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.challenge.length_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "challenge.length_days".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !(-12..=14).contains(&self.challenge.utc_offset_hours) {
            return Err(ConfigError::InvalidValue {
                key: "challenge.utc_offset_hours".to_string(),
                message: "must be within -12..=14".to_string(),
            });
        }
        for kind in XpKind::ALL {
            if self.rewards.amount_for(kind) < 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("rewards.{kind}"),
                    message: "must not be negative".to_string(),
                });
            }
        }
        Ok(())
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

    /// Set a config value by key without persisting. Unknown keys and values
    /// that fail validation are rejected and leave `self` untouched.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            actor_id: None,
            challenge: ChallengeConfig::default(),
            rewards: RewardsConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}
