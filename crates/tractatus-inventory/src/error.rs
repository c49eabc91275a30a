//! Error types for tractatus-inventory

use thiserror::Error;

/// Errors that can occur during inventory collection
#[derive(Error, Debug, Clone)]
pub enum InventoryError {
    /// Backend unreachable
    #[error("connection failed for {target}: {message}")]
    Connection {
        /// Account or organization being queried
        target: String,
        /// Underlying failure
        message: String,
    },

    /// Backend rejected the credentials
    #[error("authentication failed for {target}: {message}")]
    Authentication {
        /// Account or organization being queried
        target: String,
        /// Underlying failure
        message: String,
    },

    /// Backend returned an error while enumerating records
    #[error("backend error for {target}: {message}")]
    Backend {
        /// Account or organization being queried
        target: String,
        /// Underlying failure
        message: String,
    },

    /// Optional enrichment target does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Optional enrichment failed unexpectedly
    #[error("enrichment failed for {target} at {path}: {message}")]
    Enrichment {
        /// Record being enriched
        target: String,
        /// Path or key that was being fetched
        path: String,
        /// Underlying failure
        message: String,
    },

    /// Collection was cancelled before the target finished
    #[error("collection cancelled for {target}")]
    Cancelled {
        /// Account or organization being queried
        target: String,
    },

    /// Collection task panicked or was aborted
    #[error("collection task failed: {0}")]
    TaskFailed(String),

    /// Invalid source configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No target produced any resource
    #[error("no resources found")]
    NoResources,

    /// Error raised by a named data source
    #[error("{name} source ({target}): {source}")]
    Source {
        /// Data source kind
        name: String,
        /// Account or organization being queried
        target: String,
        /// Wrapped error
        source: Box<InventoryError>,
    },
}

impl InventoryError {
    /// Wrap an error with the data source it came from
    #[must_use]
    pub fn in_source(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        InventoryError::Source {
            name: name.into(),
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, unwrapping source wrappers
    #[must_use]
    pub fn root(&self) -> &InventoryError {
        match self {
            InventoryError::Source { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), InventoryError::Connection { .. })
    }

    /// Check if the backend rejected the credentials
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.root(), InventoryError::Authentication { .. })
    }

    /// Check if the error is an absent optional feature
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), InventoryError::NotFound(_))
    }

    /// Target named by the error, if any
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            InventoryError::Connection { target, .. }
            | InventoryError::Authentication { target, .. }
            | InventoryError::Backend { target, .. }
            | InventoryError::Enrichment { target, .. }
            | InventoryError::Cancelled { target }
            | InventoryError::Source { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_wrapping_keeps_root() {
        let err = InventoryError::Authentication {
            target: "prod".to_string(),
            message: "expired token".to_string(),
        }
        .in_source("AWS", "prod");

        assert!(err.is_auth());
        assert!(!err.is_retryable());
        assert_eq!(err.target(), Some("prod"));
        assert_eq!(
            err.to_string(),
            "AWS source (prod): authentication failed for prod: expired token"
        );
    }

    #[test]
    fn test_connection_is_retryable() {
        let err = InventoryError::Connection {
            target: "acme".to_string(),
            message: "timed out".to_string(),
        };
        assert!(err.is_retryable());
    }
}
