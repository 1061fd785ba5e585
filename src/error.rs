//! Error types for the rotsom training engine.

use thiserror::Error;

/// The main error type for rotsom operations.
#[derive(Error, Debug)]
pub enum RotsomError {
    /// Invalid configuration, detected before training starts.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input stream: bad header, truncated payload, or a
    /// dimension disagreement between header and payload.
    #[error("Input format error: {0}")]
    InputFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NaN detected in the map or the distance matrix while the
    /// numeric diagnostic mode is enabled.
    #[error("Numeric error: {0}")]
    Numeric(String),

    /// Error during training.
    #[error("Training error: {0}")]
    Training(String),
}

impl RotsomError {
    /// Process exit code for this error kind when surfaced by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            RotsomError::Config(_) => 2,
            RotsomError::InputFormat(_) => 3,
            RotsomError::Io(_) => 4,
            RotsomError::Numeric(_) => 5,
            RotsomError::Training(_) => 1,
        }
    }
}

/// Result type alias for rotsom operations.
pub type Result<T> = std::result::Result<T, RotsomError>;
