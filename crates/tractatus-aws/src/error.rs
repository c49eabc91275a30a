//! Error types for tractatus-aws

use thiserror::Error;
use tractatus_inventory::InventoryError;

/// Errors that can occur while talking to AWS
#[derive(Error, Debug, Clone)]
pub enum AwsError {
    /// Endpoint unreachable or request timed out
    #[error("connection failed: {0}")]
    Connection(String),

    /// Credentials missing, expired or rejected
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Service returned an error response
    #[error("API error ({code}): {message}")]
    Api {
        /// AWS error code
        code: String,
        /// Error message from AWS
        message: String,
    },

    /// Invalid account configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AwsError {
    /// Check if error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Connection(_))
    }

    /// Convert into the inventory taxonomy for the given account
    #[must_use]
    pub fn into_inventory_error(self, account: &str) -> InventoryError {
        let target = account.to_string();
        match self {
            AwsError::Connection(message) => InventoryError::Connection { target, message },
            AwsError::Authentication(message) => {
                InventoryError::Authentication { target, message }
            }
            AwsError::Api { .. } => InventoryError::Backend {
                target,
                message: self.to_string(),
            },
            AwsError::Config(message) => {
                InventoryError::Config(format!("account '{account}': {message}"))
            }
        }
    }
}

/// AWS error codes that mean the caller's identity was rejected
pub(crate) const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDeniedException",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "SignatureDoesNotMatch",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_maps_to_inventory_auth() {
        let err = AwsError::Authentication("expired".to_string()).into_inventory_error("prod");
        assert!(err.is_auth());
        assert_eq!(err.target(), Some("prod"));
    }

    #[test]
    fn test_api_maps_to_backend() {
        let err = AwsError::Api {
            code: "ThrottlingException".to_string(),
            message: "rate exceeded".to_string(),
        }
        .into_inventory_error("prod");
        assert!(matches!(err, InventoryError::Backend { .. }));
        assert!(err.to_string().contains("ThrottlingException"));
    }
}
