//! Tag-based classification of AWS resources
//!
//! Every attribute resolves through an ordered chain of tag keys; the first
//! key present with a non-empty value wins, otherwise a sentinel applies.

use std::collections::BTreeMap;

use tractatus_inventory::{NONE, ResourceInfo, UNKNOWN};

use crate::client::RawResource;

/// `Name` tag
pub const NAME_TAG: &str = "Name";
/// CloudFormation logical ID, set on stack-managed resources
pub const LOGICAL_ID_TAG: &str = "aws:cloudformation:logical-id";
/// CloudFormation stack name, set on stack-managed resources
pub const STACK_NAME_TAG: &str = "aws:cloudformation:stack-name";
/// Owner tag
pub const OWNED_BY_TAG: &str = "owned-by";
/// Team tag
pub const TEAM_TAG: &str = "team";

/// CI/CD platform implied by a CloudFormation stack tag
pub const STACK_CICD_PLATFORM: &str = "CloudFormation";

/// Tags marking a resource as part of an EKS cluster
pub static EKS_TAGS: &[&str] = &[
    "aws:eks:cluster-name",
    "eks:cluster-name",
    "eks:nodegroup-name",
];

/// Resource types queried from the tagging API (non-EKS compute)
pub static RESOURCE_TYPES: &[&str] = &[
    "ec2:instance",
    "lambda:function",
    "ecs:service",
    "ecs:cluster",
    "elasticbeanstalk:application",
    "elasticbeanstalk:environment",
    "lightsail:instance",
    "apprunner:service",
];

/// ARN service segment to friendly platform name
static PLATFORM_NAMES: &[(&str, &str)] = &[
    ("ec2", "EC2"),
    ("lambda", "Lambda"),
    ("ecs", "ECS"),
    ("elasticbeanstalk", "Elastic Beanstalk"),
    ("lightsail", "Lightsail"),
    ("apprunner", "App Runner"),
];

/// Check if a resource belongs to EKS
#[must_use]
pub fn is_eks_resource(tags: &BTreeMap<String, String>) -> bool {
    EKS_TAGS.iter().any(|key| tags.contains_key(*key))
}

/// First non-empty tag value among `keys`, in order
fn first_tag<'a>(tags: &'a BTreeMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| tags.get(*key))
        .map(String::as_str)
        .find(|value| !value.is_empty())
}

/// `Name` → CloudFormation logical ID → `Unknown`
#[must_use]
pub fn resolve_app_name(tags: &BTreeMap<String, String>) -> String {
    first_tag(tags, &[NAME_TAG, LOGICAL_ID_TAG])
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// `owned-by` → `team` → `Unknown`
#[must_use]
pub fn resolve_owner(tags: &BTreeMap<String, String>) -> String {
    first_tag(tags, &[OWNED_BY_TAG, TEAM_TAG])
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// `team` → `owned-by` → `Unknown`
#[must_use]
pub fn resolve_team(tags: &BTreeMap<String, String>) -> String {
    first_tag(tags, &[TEAM_TAG, OWNED_BY_TAG])
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Stack name and whether the resource is stack-managed
#[must_use]
pub fn resolve_stack(tags: &BTreeMap<String, String>) -> (String, bool) {
    match first_tag(tags, &[STACK_NAME_TAG]) {
        Some(stack) => (stack.to_string(), true),
        None => (NONE.to_string(), false),
    }
}

/// Platform name from the service segment of an ARN
///
/// ARN format: `arn:partition:service:region:account:resource`. Unmapped
/// services pass through unchanged.
#[must_use]
pub fn platform_from_arn(arn: &str) -> String {
    let Some(service) = arn.split(':').nth(2).filter(|s| !s.is_empty()) else {
        return UNKNOWN.to_string();
    };

    PLATFORM_NAMES
        .iter()
        .find(|(svc, _)| *svc == service)
        .map_or(service, |(_, friendly)| *friendly)
        .to_string()
}

/// Classify one tagged resource
///
/// Callers apply `is_eks_resource` first; this never drops a record.
#[must_use]
pub fn classify(resource: &RawResource, account: &str) -> ResourceInfo {
    let tags = &resource.tags;
    let (stack_name, has_cicd) = resolve_stack(tags);

    ResourceInfo {
        app_name: resolve_app_name(tags),
        owner: resolve_owner(tags),
        team: resolve_team(tags),
        platform: platform_from_arn(&resource.arn),
        stack_name,
        has_cicd,
        cicd_platform: if has_cicd {
            STACK_CICD_PLATFORM.to_string()
        } else {
            String::new()
        },
        account: account.to_string(),
        arn: resource.arn.clone(),
        resource_tags: tags.clone(),
        ..ResourceInfo::default()
    }
}
