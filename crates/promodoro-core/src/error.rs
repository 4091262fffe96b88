//! Core error types for promodoro-core.
//!
//! Nothing in the timer core itself is fatal -- callers recover from every
//! variant by falling back to defaults. The hierarchy exists so that the
//! storage, configuration, and HTTP layers can report precisely what went
//! wrong when a caller does care.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for promodoro-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Server API errors
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the store
    #[error("failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// A record could not be serialized for storage
    #[error("failed to encode record: {0}")]
    Encode(String),

    /// Store is locked by another process
    #[error("store is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Server API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL in configuration
    #[error("invalid base url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Server returned a non-success status
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No bearer token available for an authenticated endpoint
    #[error("not logged in")]
    NotAuthenticated,

    /// Token store (OS keyring) failure
    #[error("credential store error: {0}")]
    Keyring(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
