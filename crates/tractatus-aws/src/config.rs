//! Per-account connection settings

use std::fmt;

use serde::{Deserialize, Serialize};

/// Connection settings for one AWS account
///
/// Static keys are only used when shared-profile credentials are disabled.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Numeric account ID, informational
    #[serde(default)]
    pub account_id: Option<String>,
    /// Region to query (falls back to the environment)
    #[serde(default)]
    pub region: Option<String>,
    /// Static access key ID
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Static secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Session token for temporary credentials
    #[serde(default)]
    pub session_token: Option<String>,
}

impl AccountConfig {
    /// Create settings for a region
    pub fn with_region(region: impl Into<String>) -> Self {
        Self {
            region: Some(region.into()),
            ..Self::default()
        }
    }

    /// Static key pair, if both halves are configured
    #[must_use]
    pub fn static_keys(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
