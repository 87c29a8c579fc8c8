//! Error types for the vitals_core library.

use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vitals_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field failed parsing or range checks
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// No entry exists for the requested date
    #[error("No entry found for {0}")]
    NotFound(NaiveDate),

    /// Statistics or prediction requested without enough qualifying entries
    #[error("Not enough data: {0}")]
    InsufficientData(String),

    /// A row of an imported table is malformed (1-based data row index)
    #[error("Row {row}: {message}")]
    Parse { row: usize, message: String },

    /// Backing store could not be reached or rejected a statement
    #[error("Store unavailable: {0}")]
    Store(#[from] rusqlite::Error),

    /// Database was written by a newer schema than this binary knows
    #[error("Database schema version {found} is newer than supported {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn insufficient(what: impl Into<String>) -> Self {
        Error::InsufficientData(what.into())
    }
}
