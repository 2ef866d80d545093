//! Report error types.

use std::path::PathBuf;

use thiserror::Error;

/// Report assembly and output error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    /// Two subjects would produce sections with the same id.
    #[error("Section id '{0}' is used more than once")]
    DuplicateSection(String),

    /// A subject uses a short name that is reserved for a fixed section.
    #[error("Short name '{short_name}' of '{subject}' is reserved")]
    ReservedShortName { short_name: String, subject: String },

    /// Directory I/O error.
    #[error("Failed to {operation} directory: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error(transparent)]
    Write(#[from] hq_history::HistoryError),

    #[error("Failed to serialize {document}")]
    Json {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render sparkline")]
    Svg(#[from] std::io::Error),
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
