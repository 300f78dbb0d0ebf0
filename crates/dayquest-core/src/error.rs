//! Core error types for dayquest-core.
//!
//! Each concern gets its own thiserror enum; `CoreError` wraps them for
//! callers that just want to propagate with `?`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dayquest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Reward submission errors
    #[error("Reward error: {0}")]
    Reward(#[from] RewardError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Read or write against the backend failed
    #[error("Store backend failed: {0}")]
    Backend(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// The challenge state could not be serialized
    #[error("Failed to serialize challenge state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Day index outside the challenge window
    #[error("Day {day} is outside the challenge window 1..={length}")]
    DayOutOfRange { day: u32, length: u32 },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Structured failure reported by a ledger adapter.
///
/// Adapters set the variant from a structured signal (constraint error code,
/// HTTP status, PostgreSQL SQLSTATE). Callers match on the variant only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A row with the same uniqueness tuple already exists
    #[error("Row already exists (constraint: {constraint})")]
    ConflictAlreadyExists { constraint: String },

    /// The ledger rejected the caller's credentials
    #[error("Ledger rejected credentials")]
    Unauthorized,

    /// Any other I/O or server failure; recoverable, not retried here
    #[error("Ledger request failed: {0}")]
    Transient(String),
}

/// Outcome classes surfaced by the reward sync protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    /// No authenticated actor; nothing was sent
    #[error("Not signed in")]
    NotSignedIn,

    /// The remote ledger failed
    #[error("Remote ledger error: {0}")]
    Remote(#[from] LedgerError),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                StoreError::Locked
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                LedgerError::ConflictAlreadyExists {
                    constraint: msg.clone().unwrap_or_else(|| "unique".to_string()),
                }
            }
            _ => LedgerError::Transient(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Transient(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_error_wraps_ledger_error() {
        let err: RewardError = LedgerError::Transient("timeout".into()).into();
        assert_eq!(err, RewardError::Remote(LedgerError::Transient("timeout".into())));
        assert_ne!(err, RewardError::NotSignedIn);
    }

    #[test]
    fn day_out_of_range_message() {
        let err = ValidationError::DayOutOfRange { day: 31, length: 30 };
        assert_eq!(err.to_string(), "Day 31 is outside the challenge window 1..=30");
    }
}
