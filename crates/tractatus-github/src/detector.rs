//! File-layout heuristics for repositories
//!
//! All functions are pure and operate on the flat path listing produced by
//! [`GithubApi::list_files`](crate::client::GithubApi::list_files): root
//! entries plus the entries of a few nested directories, `/`-separated.

use tractatus_inventory::{NONE, ResourceInfo};

use crate::client::Repository;

/// How an indicator path is compared against a listed path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// The listed path must equal the indicator
    File,
    /// The listed path equals the indicator or lies beneath it
    Dir,
}

/// A path whose presence signals something about the repository
#[derive(Debug, Clone, Copy)]
struct Indicator {
    path: &'static str,
    kind: Kind,
}

impl Indicator {
    const fn file(path: &'static str) -> Self {
        Self {
            path,
            kind: Kind::File,
        }
    }

    const fn dir(path: &'static str) -> Self {
        Self {
            path,
            kind: Kind::Dir,
        }
    }

    fn matches(&self, listed: &str) -> bool {
        if listed == self.path {
            return true;
        }
        self.kind == Kind::Dir
            && listed
                .strip_prefix(self.path)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// CI/CD indicators; more specific entries come first
static CICD_INDICATORS: &[(Indicator, &str)] = &[
    (Indicator::dir(".github/workflows"), "GitHub Actions"),
    (Indicator::dir(".circleci"), "CircleCI"),
    (Indicator::file(".gitlab-ci.yml"), "GitLab CI"),
    (Indicator::file("Jenkinsfile"), "Jenkins"),
    (Indicator::file(".travis.yml"), "Travis CI"),
    (Indicator::file("azure-pipelines.yml"), "Azure Pipelines"),
    (Indicator::file("bitbucket-pipelines.yml"), "Bitbucket Pipelines"),
    (Indicator::dir(".github"), "GitHub Actions"),
];

static TEST_DIRS: &[Indicator] = &[
    Indicator::dir("test"),
    Indicator::dir("tests"),
    Indicator::dir("__tests__"),
    Indicator::dir("spec"),
    Indicator::dir("test_suite"),
    Indicator::dir("testing"),
];

/// Substrings of test file names across common languages
static TEST_FILE_PATTERNS: &[&str] = &[
    "_test.go",
    ".spec.js",
    ".test.js",
    ".spec.ts",
    ".test.ts",
    "Test.java",
    "test_",
];

/// Reason reported when a test directory is found
pub const TEST_DIR_REASON: &str = "detected test directory";
/// Reason reported when test files are found
pub const TEST_FILE_REASON: &str = "detected test files";

/// Managed Kubernetes, Helm and Kustomize indicators; matching repos are skipped
static EKS_INDICATORS: &[Indicator] = &[
    Indicator::dir("k8s"),
    Indicator::dir("kubernetes"),
    Indicator::dir(".kube"),
    Indicator::dir("helm"),
    Indicator::file("Chart.yaml"),
    Indicator::file("kustomization.yaml"),
    Indicator::file("kustomization.yml"),
];

/// Deployment platform indicator sets, in reporting order
static PLATFORM_INDICATORS: &[(&str, &[Indicator])] = &[
    (
        "ECS",
        &[
            Indicator::file("ecs-task-definition.json"),
            Indicator::file("ecs-service.json"),
            Indicator::file("Dockerfile"),
        ],
    ),
    (
        "Lambda",
        &[
            Indicator::file("serverless.yml"),
            Indicator::file("serverless.yaml"),
            Indicator::file("template.yaml"),
            Indicator::file("template.yml"),
            Indicator::dir("lambda"),
            Indicator::dir("functions"),
        ],
    ),
    (
        "Elastic Beanstalk",
        &[
            Indicator::dir(".ebextensions"),
            Indicator::file("Procfile"),
            Indicator::dir(".elasticbeanstalk"),
        ],
    ),
];

/// Where a CODEOWNERS file may live, in lookup order
pub static CODEOWNERS_PATHS: &[&str] = &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"];

/// Detect a CI/CD configuration
///
/// Files are scanned in listing order; for each file the indicator table is
/// scanned in order and the first match wins.
#[must_use]
pub fn detect_cicd(files: &[String]) -> (bool, String) {
    for file in files {
        for (indicator, platform) in CICD_INDICATORS {
            if indicator.matches(file) {
                return (true, (*platform).to_string());
            }
        }
    }
    (false, String::new())
}

/// Detect tests by directory name, then by file name pattern
#[must_use]
pub fn detect_tests(files: &[String]) -> (bool, String) {
    if files
        .iter()
        .any(|file| TEST_DIRS.iter().any(|dir| dir.matches(file)))
    {
        return (true, TEST_DIR_REASON.to_string());
    }

    let has_test_file = files.iter().any(|file| {
        let name = file.rsplit('/').next().unwrap_or(file);
        TEST_FILE_PATTERNS.iter().any(|p| name.contains(p))
    });
    if has_test_file {
        return (true, TEST_FILE_REASON.to_string());
    }

    (false, String::new())
}

/// Check if the repository deploys to managed Kubernetes
#[must_use]
pub fn is_eks(files: &[String]) -> bool {
    files
        .iter()
        .any(|file| EKS_INDICATORS.iter().any(|i| i.matches(file)))
}

/// Every deployment platform with at least one indicator present
///
/// Labels are comma-joined in table order, or `Unknown` if none matched.
#[must_use]
pub fn detect_platform(files: &[String]) -> String {
    let platforms: Vec<&str> = PLATFORM_INDICATORS
        .iter()
        .filter(|(_, indicators)| {
            files
                .iter()
                .any(|file| indicators.iter().any(|i| i.matches(file)))
        })
        .map(|(label, _)| *label)
        .collect();

    if platforms.is_empty() {
        return tractatus_inventory::UNKNOWN.to_string();
    }
    platforms.join(", ")
}

/// CODEOWNERS candidates present in the listing, in lookup order
#[must_use]
pub fn code_owners_paths(files: &[String]) -> Vec<&'static str> {
    CODEOWNERS_PATHS
        .iter()
        .copied()
        .filter(|candidate| files.iter().any(|f| f == candidate))
        .collect()
}

/// Parse owners out of CODEOWNERS content
///
/// Each rule is `pattern owner...`. `@user` and `@org/team` owners are
/// returned without the `@`; e-mail addresses are returned as is. Owners are
/// de-duplicated in first-seen order.
#[must_use]
pub fn parse_code_owners(content: &str) -> Vec<String> {
    let mut owners: Vec<String> = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        for token in line.split_whitespace().skip(1) {
            let owner = if let Some(handle) = token.strip_prefix('@') {
                handle
            } else if token.contains('@') {
                token
            } else {
                continue;
            };

            if !owner.is_empty() && !owners.iter().any(|o| o == owner) {
                owners.push(owner.to_string());
            }
        }
    }

    owners
}

/// Classify a repository snapshot
///
/// Returns `None` for repositories excluded as managed Kubernetes; the check
/// runs before anything else is derived.
#[must_use]
pub fn classify_repository(repo: &Repository, code_owners: Option<&str>) -> Option<ResourceInfo> {
    if is_eks(&repo.files) {
        return None;
    }

    let (has_cicd, cicd_platform) = detect_cicd(&repo.files);
    let (has_tests, test_framework) = detect_tests(&repo.files);
    let has_code_owners = !code_owners_paths(&repo.files).is_empty();
    let owners = code_owners.map(parse_code_owners).unwrap_or_default();
    let first_owner = owners.first().cloned().unwrap_or_default();

    let info = ResourceInfo {
        app_name: repo.name.clone(),
        owner: first_owner.clone(),
        team: first_owner,
        platform: detect_platform(&repo.files),
        stack_name: NONE.to_string(),
        has_cicd,
        cicd_platform,
        has_tests,
        test_framework,
        github_repo: repo.name.clone(),
        repo_url: repo.html_url.clone(),
        is_archived: repo.is_archived,
        has_code_owners,
        code_owners: owners,
        last_committer: repo.last_committer.clone(),
        last_commit_date: repo.last_commit_date,
        ..ResourceInfo::default()
    };

    Some(info.with_ownership_defaults())
}
