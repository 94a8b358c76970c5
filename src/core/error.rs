//! Error types for core module
//!
//! Covers settings persistence and validation. Settings problems at startup
//! are never fatal: loading falls back to defaults and only saving reports
//! errors to the caller.

use thiserror::Error;

/// Errors that can occur in the core module
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings file I/O error
    #[error("Settings I/O error: {0}")]
    SettingsIo(#[from] std::io::Error),

    /// Settings serialization/deserialization error
    #[error("Settings serialization error: {0}")]
    SettingsSerialization(#[from] serde_json::Error),

    /// A setting holds a value the session cannot run with
    #[error("Invalid setting '{field}': {message}")]
    InvalidSetting { field: &'static str, message: String },
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
