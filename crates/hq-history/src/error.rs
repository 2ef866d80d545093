//! History error types.

use std::path::PathBuf;

use thiserror::Error;

/// History operation error.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The history file is not valid JSON or has the wrong shape.
    #[error("Invalid history file {path}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The history could not be serialized.
    #[error("Failed to serialize history")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Atomic write failed (temp file couldn't be renamed).
    #[error("Failed to complete save operation")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
