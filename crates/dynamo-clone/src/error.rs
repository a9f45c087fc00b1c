//! Error types for the clone library.

use thiserror::Error;

/// Main error type for clone operations.
#[derive(Error, Debug)]
pub enum CloneError {
    /// Configuration error (missing parameter, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source table scan error
    #[error("Source table error: {0}")]
    Source(String),

    /// Destination table write error
    #[error("Destination table error: {0}")]
    Target(String),

    /// Checkpoint document error (unwritable state file, no home directory, etc.)
    #[error("Checkpoint state error: {0}")]
    State(String),

    /// Interactive prompt error
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloneError {
    /// Create a Source error.
    pub fn source(message: impl Into<String>) -> Self {
        CloneError::Source(message.into())
    }

    /// Create a Target error.
    pub fn target(message: impl Into<String>) -> Self {
        CloneError::Target(message.into())
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CloneError::Config(_) => 2,
            CloneError::State(_) => 3,
            _ => 1,
        }
    }
}

/// Result type alias for clone operations.
pub type Result<T> = std::result::Result<T, CloneError>;
