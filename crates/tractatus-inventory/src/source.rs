//! Data source capability

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::error::InventoryError;
use crate::types::ResourceInfo;

/// A backend that can be enumerated into normalized resources
///
/// Implementations follow pagination to exhaustion, drop records matched by
/// their exclusion rule and classify everything else. Missing signal on a
/// record resolves to sentinel defaults; only connectivity or authentication
/// failures are returned as errors.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Source kind label (`AWS`, `GitHub`)
    fn name(&self) -> &str;

    /// Account or organization this source queries
    fn target(&self) -> &str;

    /// Enumerate and classify every record of the target
    async fn collect(&self) -> Result<Vec<ResourceInfo>, InventoryError>;
}

/// Backend kind, selected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// AWS Resource Groups Tagging API
    Aws,
    /// GitHub organization repositories
    Github,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Aws => write!(f, "aws"),
            SourceKind::Github => write!(f, "github"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(SourceKind::Aws),
            "github" => Ok(SourceKind::Github),
            other => Err(InventoryError::Config(format!(
                "unknown source '{other}', use 'github' or 'aws'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("aws".parse::<SourceKind>().unwrap(), SourceKind::Aws);
        assert_eq!(" GitHub ".parse::<SourceKind>().unwrap(), SourceKind::Github);
        assert!("gitlab".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_source_kind_display_round_trips() {
        for kind in [SourceKind::Aws, SourceKind::Github] {
            assert_eq!(kind.to_string().parse::<SourceKind>().unwrap(), kind);
        }
    }
}
