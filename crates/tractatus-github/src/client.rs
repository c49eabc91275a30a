//! HTTP client for the GitHub REST API

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{GithubError, Result};

/// Public GitHub API endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com/";

/// Repositories requested per page
const PER_PAGE: usize = 100;

/// Attempts per request, including the first
const MAX_ATTEMPTS: u32 = 3;

/// Directories whose entries are listed alongside the root
const NESTED_DIRS: &[&str] = &[".github", "docs"];

/// Repository metadata from the organization listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSummary {
    /// Repository name
    pub name: String,
    /// Web URL
    pub html_url: String,
    /// Whether the repository is archived
    pub archived: bool,
}

/// Most recent commit on the default branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Login of the author, else the git author name
    pub committer: String,
    /// Author date
    pub date: Option<DateTime<Utc>>,
}

/// Everything known about a repository before classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Web URL
    pub html_url: String,
    /// Whether the repository is archived
    pub is_archived: bool,
    /// Root entries plus entries of nested directories, as paths
    pub files: Vec<String>,
    /// Author of the most recent commit
    pub last_committer: String,
    /// Date of the most recent commit
    pub last_commit_date: Option<DateTime<Utc>>,
}

impl Repository {
    /// Assemble a repository snapshot
    #[must_use]
    pub fn new(summary: RepoSummary, files: Vec<String>, commit: Option<CommitInfo>) -> Self {
        let (last_committer, last_commit_date) =
            commit.map_or((String::new(), None), |c| (c.committer, c.date));
        Self {
            name: summary.name,
            html_url: summary.html_url,
            is_archived: summary.archived,
            files,
            last_committer,
            last_commit_date,
        }
    }
}

/// Read access to an organization's repositories
#[async_trait]
pub trait GithubApi: Send + Sync {
    /// Organization being queried
    fn org(&self) -> &str;

    /// List every repository, following pagination
    async fn list_repositories(&self, exclude_archived: bool) -> Result<Vec<RepoSummary>>;

    /// Root entries plus the entries of known nested directories
    ///
    /// An empty repository yields an empty listing.
    async fn list_files(&self, repo: &str) -> Result<Vec<String>>;

    /// Most recent commit, `None` for an empty repository
    async fn last_commit(&self, repo: &str) -> Result<Option<CommitInfo>>;

    /// Decoded content of a file
    ///
    /// Returns `NotFound` if the file does not exist.
    async fn get_file_content(&self, repo: &str, path: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RepoRow {
    name: String,
    html_url: String,
    #[serde(default)]
    archived: bool,
}

#[derive(Deserialize)]
struct ContentEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct CommitRow {
    commit: CommitDetail,
    author: Option<AccountRow>,
}

#[derive(Deserialize)]
struct CommitDetail {
    author: Option<GitActor>,
}

#[derive(Deserialize)]
struct GitActor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct AccountRow {
    login: String,
}

#[derive(Deserialize)]
struct FileRow {
    content: Option<String>,
    encoding: Option<String>,
}

/// reqwest-backed GitHub client for one organization
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: Url,
    org: String,
}

impl GithubClient {
    /// Create a client for the public GitHub API
    ///
    /// # Errors
    /// Returns `Config` if the token or organization is empty.
    pub fn new(token: &str, org: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_URL, token, org)
    }

    /// Create a client for a GitHub Enterprise endpoint
    ///
    /// # Errors
    /// Returns `Config` if the token or organization is empty, or `Url` if
    /// the base URL is invalid.
    pub fn with_base_url(base_url: impl AsRef<str>, token: &str, org: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(GithubError::Config("github token is required".to_string()));
        }
        if org.is_empty() {
            return Err(GithubError::Config(
                "github organization is required".to_string(),
            ));
        }

        let mut base = base_url.as_ref().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| GithubError::Config(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("tractatus/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            org: org.to_string(),
        })
    }

    /// Build a full URL from a relative path
    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(GithubError::Url)
    }

    /// Perform a GET request, retrying transient failures
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let mut backoff = Duration::from_millis(500);
        let mut attempt = 1;

        loop {
            match self.get_once(url.clone(), path).await {
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(error = %e, attempt, ?backoff, path, "github request failed, retrying");
                    sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url, path: &str) -> Result<T> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GithubError::from_status(status, path, message));
        }

        let body = response.bytes().await?;
        decode_body(&body)
    }

    async fn list_dir(&self, repo: &str, dir: &str) -> Result<Vec<ContentEntry>> {
        let path = if dir.is_empty() {
            format!("repos/{}/{repo}/contents", self.org)
        } else {
            format!("repos/{}/{repo}/contents/{dir}", self.org)
        };
        self.get(&path).await
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    fn org(&self) -> &str {
        &self.org
    }

    #[instrument(skip(self), fields(org = %self.org))]
    async fn list_repositories(&self, exclude_archived: bool) -> Result<Vec<RepoSummary>> {
        let mut repos = Vec::new();
        let mut page = 1usize;

        loop {
            let rows: Vec<RepoRow> = self
                .get(&format!(
                    "orgs/{}/repos?type=all&per_page={PER_PAGE}&page={page}",
                    self.org
                ))
                .await?;
            let last_page = rows.len() < PER_PAGE;

            repos.extend(
                rows.into_iter()
                    .filter(|r| !(exclude_archived && r.archived))
                    .map(|r| RepoSummary {
                        name: r.name,
                        html_url: r.html_url,
                        archived: r.archived,
                    }),
            );

            if last_page {
                break;
            }
            page += 1;
        }

        debug!(pages = page, repos = repos.len(), "listed repositories");
        Ok(repos)
    }

    async fn list_files(&self, repo: &str) -> Result<Vec<String>> {
        let root = match self.list_dir(repo, "").await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::with_capacity(root.len());
        let mut nested = Vec::new();
        for entry in root {
            if entry.kind == "dir" && NESTED_DIRS.contains(&entry.name.as_str()) {
                nested.push(entry.path.clone());
            }
            files.push(entry.path);
        }

        for dir in nested {
            match self.list_dir(repo, &dir).await {
                Ok(entries) => files.extend(entries.into_iter().map(|e| e.path)),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(files)
    }

    async fn last_commit(&self, repo: &str) -> Result<Option<CommitInfo>> {
        let rows: Vec<CommitRow> = match self
            .get(&format!("repos/{}/{repo}/commits?per_page=1", self.org))
            .await
        {
            Ok(rows) => rows,
            // 409: repository is empty
            Err(GithubError::Api { status: 409, .. }) => return Ok(None),
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(rows.into_iter().next().map(|row| {
            let (name, date) = row
                .commit
                .author
                .map_or((None, None), |a| (a.name, a.date));
            CommitInfo {
                committer: row.author.map(|a| a.login).or(name).unwrap_or_default(),
                date,
            }
        }))
    }

    async fn get_file_content(&self, repo: &str, path: &str) -> Result<String> {
        let row: FileRow = self
            .get(&format!("repos/{}/{repo}/contents/{path}", self.org))
            .await?;
        decode_content(row.content.as_deref(), row.encoding.as_deref())
    }
}

/// Deserialize a success body; malformed payloads are `Json` errors
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Decode a contents API payload
///
/// GitHub wraps base64 content at 60 columns.
fn decode_content(content: Option<&str>, encoding: Option<&str>) -> Result<String> {
    let Some(content) = content else {
        return Ok(String::new());
    };

    if encoding != Some("base64") {
        return Ok(content.to_string());
    }

    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| GithubError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GithubError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use tractatus_inventory::InventoryError;

    use super::*;

    #[test]
    fn test_new_requires_token_and_org() {
        assert!(matches!(
            GithubClient::new("", "acme"),
            Err(GithubError::Config(_))
        ));
        assert!(matches!(
            GithubClient::new("ghp_x", ""),
            Err(GithubError::Config(_))
        ));
    }

    #[test]
    fn test_enterprise_base_url_keeps_prefix() {
        let client = GithubClient::with_base_url("https://ghe.example.com/api/v3", "t", "acme")
            .unwrap();
        let url = client.url("orgs/acme/repos?per_page=100&page=1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/orgs/acme/repos?per_page=100&page=1"
        );
    }

    #[test]
    fn test_nested_file_url() {
        let client = GithubClient::new("t", "acme").unwrap();
        let url = client.url("repos/acme/api/contents/.github/CODEOWNERS").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/api/contents/.github/CODEOWNERS"
        );
    }

    #[test]
    fn test_decode_wrapped_base64() {
        // "* @alice\n" split across lines as the API returns it
        let decoded = decode_content(Some("KiBAYWxp\nY2UK\n"), Some("base64")).unwrap();
        assert_eq!(decoded, "* @alice\n");
    }

    #[test]
    fn test_decode_passthrough_and_missing() {
        assert_eq!(decode_content(Some("raw"), None).unwrap(), "raw");
        assert_eq!(decode_content(None, Some("base64")).unwrap(), "");
        assert!(matches!(
            decode_content(Some("!!!"), Some("base64")),
            Err(GithubError::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_body_is_a_json_error() {
        let err = decode_body::<Vec<RepoRow>>(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, GithubError::Json(_)));
        assert!(!err.is_retryable());

        let err = err.into_inventory_error("acme");
        assert!(matches!(err, InventoryError::Backend { .. }));
        assert_eq!(err.target(), Some("acme"));
    }

    #[test]
    fn test_decode_body_reads_rows() {
        let rows: Vec<RepoRow> =
            decode_body(br#"[{"name":"api","html_url":"https://github.com/acme/api"}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "api");
        assert!(!rows[0].archived);
    }

    #[test]
    fn test_repository_snapshot_from_parts() {
        let summary = RepoSummary {
            name: "api".to_string(),
            html_url: "https://github.com/acme/api".to_string(),
            archived: true,
        };
        let repo = Repository::new(
            summary,
            vec!["Dockerfile".to_string()],
            Some(CommitInfo {
                committer: "alice".to_string(),
                date: None,
            }),
        );
        assert!(repo.is_archived);
        assert_eq!(repo.last_committer, "alice");

        let empty = Repository::new(
            RepoSummary {
                name: "empty".to_string(),
                html_url: String::new(),
                archived: false,
            },
            Vec::new(),
            None,
        );
        assert!(empty.last_committer.is_empty());
    }
}
