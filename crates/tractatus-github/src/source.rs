//! GitHub organization data source

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};
use tractatus_inventory::{DataSource, InventoryError, ResourceInfo};

use crate::client::{GithubApi, RepoSummary, Repository};
use crate::detector::{classify_repository, code_owners_paths, is_eks};

/// Repositories analyzed at once by default
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Repositories of one GitHub organization
pub struct GithubDataSource {
    api: Arc<dyn GithubApi>,
    exclude_archived: bool,
    concurrency: usize,
}

impl GithubDataSource {
    /// Create a new source over a GitHub client
    pub fn new(api: Arc<dyn GithubApi>, exclude_archived: bool) -> Self {
        Self {
            api,
            exclude_archived,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limit how many repositories are analyzed concurrently
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch everything needed to classify one repository
    ///
    /// Enrichment failures are logged and degrade the record; they never fail
    /// the collection.
    async fn analyze(&self, summary: RepoSummary) -> Option<ResourceInfo> {
        let repo_name = summary.name.clone();

        let files = match self.api.list_files(&repo_name).await {
            Ok(files) => files,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                warn!(repo = %repo_name, error = %e, "failed to list repository files");
                Vec::new()
            }
        };

        if is_eks(&files) {
            debug!(repo = %repo_name, "skipping Kubernetes-deployed repository");
            return None;
        }

        let commit = match self.api.last_commit(&repo_name).await {
            Ok(commit) => commit,
            Err(e) => {
                warn!(repo = %repo_name, error = %e, "failed to fetch last commit");
                None
            }
        };

        let code_owners = self.code_owners(&repo_name, &files).await;
        let repo = Repository::new(summary, files, commit);
        classify_repository(&repo, code_owners.as_deref())
    }

    /// Content of the first CODEOWNERS candidate that can be read
    async fn code_owners(&self, repo: &str, files: &[String]) -> Option<String> {
        for path in code_owners_paths(files) {
            match self.api.get_file_content(repo, path).await {
                Ok(content) => return Some(content),
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    let err = InventoryError::Enrichment {
                        target: repo.to_string(),
                        path: path.to_string(),
                        message: e.to_string(),
                    };
                    warn!(error = %err, "failed to read CODEOWNERS");
                }
            }
        }
        None
    }
}

#[async_trait]
impl DataSource for GithubDataSource {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn target(&self) -> &str {
        self.api.org()
    }

    #[instrument(skip(self), fields(org = %self.api.org()))]
    async fn collect(&self) -> Result<Vec<ResourceInfo>, InventoryError> {
        let org = self.api.org();

        let repos = self
            .api
            .list_repositories(self.exclude_archived)
            .await
            .map_err(|e| e.into_inventory_error(org))?;
        let listed = repos.len();

        // Order preserving; at most `concurrency` repositories in flight
        let analyzed: Vec<Option<ResourceInfo>> = stream::iter(repos)
            .map(|summary| self.analyze(summary))
            .buffered(self.concurrency)
            .collect()
            .await;
        let resources: Vec<ResourceInfo> = analyzed.into_iter().flatten().collect();

        info!(
            repositories = listed,
            resources = resources.len(),
            skipped = listed - resources.len(),
            "classified organization repositories"
        );

        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tractatus_inventory::UNKNOWN;

    use super::*;
    use crate::client::CommitInfo;
    use crate::error::{GithubError, Result};

    struct MockGithub {
        repos: Vec<RepoSummary>,
        files: HashMap<String, Vec<String>>,
        owners: HashMap<(String, String), String>,
        unlistable: Vec<String>,
    }

    impl MockGithub {
        fn new() -> Self {
            Self {
                repos: Vec::new(),
                files: HashMap::new(),
                owners: HashMap::new(),
                unlistable: Vec::new(),
            }
        }

        fn unlistable(mut self, repo: &str) -> Self {
            self.unlistable.push(repo.to_string());
            self
        }

        fn repo(mut self, name: &str, archived: bool, files: &[&str]) -> Self {
            self.repos.push(RepoSummary {
                name: name.to_string(),
                html_url: format!("https://github.com/acme/{name}"),
                archived,
            });
            self.files.insert(
                name.to_string(),
                files.iter().map(|f| (*f).to_string()).collect(),
            );
            self
        }

        fn owners(mut self, repo: &str, path: &str, content: &str) -> Self {
            self.owners
                .insert((repo.to_string(), path.to_string()), content.to_string());
            self
        }
    }

    #[async_trait]
    impl GithubApi for MockGithub {
        fn org(&self) -> &str {
            "acme"
        }

        async fn list_repositories(&self, exclude_archived: bool) -> Result<Vec<RepoSummary>> {
            Ok(self
                .repos
                .iter()
                .filter(|r| !(exclude_archived && r.archived))
                .cloned()
                .collect())
        }

        async fn list_files(&self, repo: &str) -> Result<Vec<String>> {
            if self.unlistable.iter().any(|r| r == repo) {
                return Err(GithubError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                });
            }
            Ok(self.files.get(repo).cloned().unwrap_or_default())
        }

        async fn last_commit(&self, _repo: &str) -> Result<Option<CommitInfo>> {
            Ok(Some(CommitInfo {
                committer: "carol".to_string(),
                date: None,
            }))
        }

        async fn get_file_content(&self, repo: &str, path: &str) -> Result<String> {
            self.owners
                .get(&(repo.to_string(), path.to_string()))
                .cloned()
                .ok_or_else(|| GithubError::NotFound(path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_collect_classifies_and_skips_eks() {
        let api = MockGithub::new()
            .repo("web", false, &["Dockerfile", "CODEOWNERS"])
            .repo("cluster", false, &["helm", "Dockerfile"])
            .owners("web", "CODEOWNERS", "* @acme/web\n");
        let source = GithubDataSource::new(Arc::new(api), false);

        let resources = source.collect().await.unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].app_name, "web");
        assert_eq!(resources[0].owner, "acme/web");
        assert_eq!(resources[0].last_committer, "carol");
    }

    #[tokio::test]
    async fn test_exclude_archived() {
        let api = MockGithub::new()
            .repo("live", false, &[])
            .repo("old", true, &[]);
        let source = GithubDataSource::new(Arc::new(api), true);

        let resources = source.collect().await.unwrap();
        let names: Vec<_> = resources.iter().map(|r| r.app_name.as_str()).collect();
        assert_eq!(names, ["live"]);
    }

    #[tokio::test]
    async fn test_code_owners_falls_through_missing_candidates() {
        // Listed at the root but unreadable; the .github copy answers
        let api = MockGithub::new()
            .repo("svc", false, &["CODEOWNERS", ".github", ".github/CODEOWNERS"])
            .owners("svc", ".github/CODEOWNERS", "* @dave");
        let source = GithubDataSource::new(Arc::new(api), false).with_concurrency(1);

        let resources = source.collect().await.unwrap();
        assert_eq!(resources[0].owner, "dave");
        assert!(resources[0].has_code_owners);
    }

    #[tokio::test]
    async fn test_listing_failure_classifies_from_empty_listing() {
        // Kubernetes indicators are invisible when the listing fails
        let api = MockGithub::new()
            .repo("cluster", false, &["helm", "Dockerfile", ".github/workflows"])
            .repo("web", false, &["Dockerfile"])
            .unlistable("cluster");
        let source = GithubDataSource::new(Arc::new(api), false);

        let resources = source.collect().await.unwrap();

        assert_eq!(resources.len(), 2);
        let cluster = &resources[0];
        assert_eq!(cluster.app_name, "cluster");
        assert_eq!(cluster.platform, UNKNOWN);
        assert_eq!(cluster.owner, UNKNOWN);
        assert_eq!(cluster.team, UNKNOWN);
        assert!(!cluster.has_cicd);
        assert!(!cluster.has_tests);
        assert!(!cluster.has_code_owners);
        assert_eq!(cluster.last_committer, "carol");
        assert_eq!(resources[1].platform, "ECS");
    }

    #[test]
    fn test_concurrency_floor() {
        let source = GithubDataSource::new(Arc::new(MockGithub::new()), false).with_concurrency(0);
        assert_eq!(source.concurrency, 1);
        assert_eq!(source.target(), "acme");
        assert_eq!(source.name(), "GitHub");
    }
}
