//! Error types for metric source adapters.

use thiserror::Error;

/// Errors that can occur while reading a metric source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the timeout.
    #[error("request to {host} timed out")]
    Timeout {
        /// Host and port that timed out.
        host: String,
    },

    /// The request was not sent because the host timed out earlier.
    #[error("skipped because {host} timed out before")]
    SkippedHost {
        /// Host and port that timed out earlier.
        host: String,
    },

    /// The server answered with an error status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested url.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Failed to parse a JSON response.
    #[error("JSON parse error: {0}")]
    Json(String),

    /// Failed to parse an XML response.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// A response could be read but did not contain a usable value.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// No ids were given for a source that needs them.
    #[error("no source ids configured")]
    NoIds,

    /// A url could not be constructed or parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A version control command could not run or exited with an error.
    #[error("command failed: {0}")]
    Command(String),
}

impl SourceError {
    /// Returns whether the error was caused by a (previous) timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::SkippedHost { .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<regex::Error> for SourceError {
    fn from(err: regex::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_recognized() {
        assert!(
            SourceError::Timeout {
                host: "sonar:9000".to_string()
            }
            .is_timeout()
        );
        assert!(
            SourceError::SkippedHost {
                host: "sonar:9000".to_string()
            }
            .is_timeout()
        );
        assert!(!SourceError::NoIds.is_timeout());
    }

    #[test]
    fn messages() {
        let error = SourceError::Status {
            url: "http://jenkins/api/json".to_string(),
            status: 404,
        };
        assert_eq!(error.to_string(), "HTTP 404 from http://jenkins/api/json");
        let error = SourceError::SkippedHost {
            host: "jenkins:8080".to_string(),
        };
        assert_eq!(error.to_string(), "skipped because jenkins:8080 timed out before");
    }
}
