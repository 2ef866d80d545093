use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a project definition.
#[derive(Debug, Error)]
pub enum ModelError {
    /// File I/O error.
    #[error("Failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project definition is not valid TOML or has the wrong shape.
    #[error("Invalid project definition {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The project definition is well formed but inconsistent.
    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
