//! Error types for the lift_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lift_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before any computation (bad increment, malformed set spec)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced routine, exercise, program, goal or session does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid state transition
    #[error("State error: {0}")]
    State(String),

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
    /// True for errors raised by a storage collaborator rather than the engine
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Toml(_)
        )
    }
}
