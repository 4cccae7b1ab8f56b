//! Core error types for reelguard-core.
//!
//! Only ledger failures ever reach the caller of the enforcement engine.
//! Snapshot and classification problems are absorbed where they happen and
//! degrade to "not counted".

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for reelguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Usage ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Snapshot provider errors
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Usage ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open the backing database
    #[error("Failed to open ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Ledger is locked")]
    Locked,

    /// A stored value is not a non-negative integer
    #[error("Corrupt ledger value for '{key}': {value}")]
    Corrupt { key: String, value: String },

    /// An in-process lock was poisoned by a panicking writer
    #[error("Ledger state poisoned")]
    Poisoned,

    /// Limit outside the accepted range
    #[error("Limit {0} is outside the accepted range [10, 10000]")]
    InvalidLimit(u32),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised by a snapshot provider when the UI tree cannot be obtained.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// No active window / root node right now
    #[error("Snapshot unavailable: {0}")]
    Unavailable(String),

    /// The provider produced something it could not turn into a tree
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}

/// Errors surfaced by [`crate::engine::EnforcementController::on_event`].
///
/// Everything else in the pipeline degrades to a safe default instead.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The usage increment did not complete; the event is not durably counted.
    #[error("Failed to record usage: {0}")]
    LedgerWrite(#[source] LedgerError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    LedgerError::Locked
                } else {
                    LedgerError::QueryFailed(err.to_string())
                }
            }
            _ => LedgerError::QueryFailed(err.to_string()),
        }
    }
}

impl From<EngineError> for CoreError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::LedgerWrite(inner) => CoreError::Ledger(inner),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
