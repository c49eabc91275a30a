//! Inventory type definitions

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for attributes with no classification signal
pub const UNKNOWN: &str = "Unknown";

/// Sentinel for an absent IaC stack
pub const NONE: &str = "None";

// ============================================================================
// Resource
// ============================================================================

/// Normalized inventory record
///
/// Fields are a superset across backends. A source fills in the subset it
/// knows about and leaves the rest at their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    /// Best-effort human name of the application
    pub app_name: String,
    /// Owning person or group
    pub owner: String,
    /// Owning team
    pub team: String,
    /// Deployment platform, comma-joined when several co-occur
    pub platform: String,
    /// IaC stack identity, or `None`
    pub stack_name: String,
    /// Whether a CI/CD pipeline was detected
    pub has_cicd: bool,
    /// CI/CD platform name
    pub cicd_platform: String,
    /// Whether tests were detected
    pub has_tests: bool,
    /// How the tests were detected
    pub test_framework: String,

    // AWS
    /// Account name the resource was collected from
    pub account: String,
    /// Resource ARN
    pub arn: String,
    /// Raw tags, kept for auditability
    pub resource_tags: BTreeMap<String, String>,

    // GitHub
    /// Repository name
    pub github_repo: String,
    /// Repository web URL
    pub repo_url: String,
    /// Whether the repository is archived
    pub is_archived: bool,
    /// Whether a CODEOWNERS file was found
    pub has_code_owners: bool,
    /// Owners parsed from CODEOWNERS, first-seen order
    pub code_owners: Vec<String>,
    /// Author of the most recent commit
    pub last_committer: String,
    /// Date of the most recent commit
    pub last_commit_date: Option<DateTime<Utc>>,
}

impl ResourceInfo {
    /// Replace empty ownership fields with the `Unknown` sentinel
    #[must_use]
    pub fn with_ownership_defaults(mut self) -> Self {
        if self.owner.is_empty() {
            self.owner = UNKNOWN.to_string();
        }
        if self.team.is_empty() {
            self.team = UNKNOWN.to_string();
        }
        self
    }

    /// Whether this record came from a repository source
    #[must_use]
    pub fn is_repository(&self) -> bool {
        !self.github_repo.is_empty()
    }

    /// Individual platform labels of a possibly comma-joined `platform`
    pub fn platforms(&self) -> impl Iterator<Item = &str> {
        self.platform
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// ============================================================================
// Inventory
// ============================================================================

/// Ordered collection of resources from one or more collection passes
///
/// Insertion order is traversal order. No sort is implied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Collected resources
    pub resources: Vec<ResourceInfo>,
}

impl Inventory {
    /// Create a new empty inventory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already classified resources
    #[must_use]
    pub fn from_resources(resources: Vec<ResourceInfo>) -> Self {
        Self { resources }
    }

    /// Number of resources
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the inventory holds no resources
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Append another inventory's resources, keeping their order
    pub fn append(&mut self, other: Inventory) {
        self.resources.extend(other.resources);
    }

    /// Resource count per platform label, sorted by label
    ///
    /// A record with a comma-joined platform counts once for each label.
    #[must_use]
    pub fn platform_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for res in &self.resources {
            for platform in res.platforms() {
                *counts.entry(platform.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Number of resources with a detected CI/CD pipeline
    #[must_use]
    pub fn cicd_count(&self) -> usize {
        self.resources.iter().filter(|r| r.has_cicd).count()
    }
}

impl From<Vec<ResourceInfo>> for Inventory {
    fn from(resources: Vec<ResourceInfo>) -> Self {
        Self::from_resources(resources)
    }
}
