//! Core error types for recovery-core.
//!
//! This module defines the error hierarchy using thiserror. Every error
//! is recoverable at the call site; only [`CoreError::StoreUnavailable`]
//! is worth retrying.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for recovery-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed caller input (duration, reminder time, keys)
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An active plan already exists for the same user and behavior
    #[error("An active plan ({plan_id}) already exists for '{addiction_key}' (user '{user_id}')")]
    Conflict {
        user_id: String,
        addiction_key: String,
        plan_id: i64,
    },

    /// Check-in date outside the owning plan's window
    #[error("Date {date} is outside the plan window {start}..={end}")]
    OutOfRange {
        date: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Plan or reminder store failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// No plan with this id
    #[error("Plan {plan_id} not found")]
    NotFound { plan_id: i64 },

    /// Final summary requested before the plan ended
    #[error("Plan {plan_id} is still active until {end_date}")]
    PlanNotCompleted { plan_id: i64, end_date: NaiveDate },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

/// Store-specific errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// A stored record could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Clock label not in 24-hour "HH:MM" form
    #[error("Invalid reminder time '{0}': expected HH:MM with hour 00-23 and minute 00-59")]
    InvalidClockTime(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::StoreUnavailable(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_store_errors_are_retryable() {
        assert!(CoreError::StoreUnavailable(StoreError::Locked).is_retryable());
        assert!(!CoreError::NotFound { plan_id: 1 }.is_retryable());
        assert!(!CoreError::Validation(ValidationError::InvalidClockTime("9".into())).is_retryable());
    }

    #[test]
    fn messages_name_the_offending_input() {
        let err = CoreError::OutOfRange {
            date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Date 2024-03-11 is outside the plan window 2024-03-01..=2024-03-05"
        );

        let err = ValidationError::InvalidClockTime("24:00".into());
        assert!(err.to_string().contains("24:00"));
    }
}
