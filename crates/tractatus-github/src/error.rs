//! Error types for the GitHub client

use thiserror::Error;
use tractatus_inventory::InventoryError;

/// Errors that can occur when talking to the GitHub API
#[derive(Error, Debug)]
pub enum GithubError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Token missing, invalid or lacking access
    #[error("Authentication failed ({status}): {message}")]
    Authentication {
        /// HTTP status code
        status: u16,
        /// Error message from GitHub
        message: String,
    },

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from GitHub
        message: String,
    },

    /// File content could not be decoded
    #[error("Invalid content: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GithubError>;

impl GithubError {
    /// Classify a non-success response
    #[must_use]
    pub fn from_status(status: u16, path: &str, message: String) -> Self {
        match status {
            401 => GithubError::Authentication { status, message },
            403 if !message.to_lowercase().contains("rate limit") => {
                GithubError::Authentication { status, message }
            }
            404 => GithubError::NotFound(path.to_string()),
            _ => GithubError::Api { status, message },
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            GithubError::Http(e) => e.is_timeout() || e.is_connect(),
            GithubError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if the resource simply does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, GithubError::NotFound(_))
    }

    /// Convert into the inventory taxonomy for the given target
    #[must_use]
    pub fn into_inventory_error(self, target: &str) -> InventoryError {
        let target = target.to_string();
        match self {
            GithubError::Http(e) => InventoryError::Connection {
                target,
                message: e.to_string(),
            },
            GithubError::Authentication { .. } => InventoryError::Authentication {
                target,
                message: self.to_string(),
            },
            GithubError::NotFound(path) => InventoryError::NotFound(path),
            GithubError::Config(message) => InventoryError::Config(message),
            GithubError::Json(e) => InventoryError::Backend {
                target,
                message: format!("malformed response: {e}"),
            },
            other => InventoryError::Backend {
                target,
                message: other.to_string(),
            },
        }
    }
}
