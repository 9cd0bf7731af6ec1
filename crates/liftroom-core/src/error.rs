//! Core error types for liftroom-core.
//!
//! This module defines the error hierarchy using thiserror. Only
//! [`SessionError::SessionAlreadyActive`] is meant to reach the user; sync
//! failures are swallowed at the publish site and invalid set references are
//! logged no-ops inside the controller.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for liftroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Sync boundary errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Plan import errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the session controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A session is already running on this device.
    #[error("a workout session is already active ({workout_name}); finish it before starting another")]
    SessionAlreadyActive { workout_name: String },

    /// The command needs a running session.
    #[error("no active workout session")]
    NoActiveSession,

    /// Exercise/set coordinates outside the ledger.
    #[error("set reference out of range: exercise {exercise_index}, set {set_index}")]
    InvalidSetReference {
        exercise_index: usize,
        set_index: usize,
    },

    /// No plan matches the given id or name.
    #[error("workout plan not found: {0}")]
    PlanNotFound(String),

    /// The session runner task has shut down.
    #[error("session runner is no longer running")]
    RunnerClosed,
}

/// Errors raised by a sync boundary surface.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The surface could not be reached.
    #[error("sync boundary unavailable: {0}")]
    Unavailable(String),

    /// Writing or reading the surface failed.
    #[error("sync surface io at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The surface payload could not be encoded or decoded.
    #[error("sync payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
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

    /// A stored blob could not be decoded
    #[error("Corrupt value under key '{key}': {message}")]
    CorruptValue { key: String, message: String },
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Plan import errors, positioned at the offending input line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("input contains no exercises")]
    Empty,

    #[error("invalid pattern: {0}")]
    Pattern(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseBusy
                    || err.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
