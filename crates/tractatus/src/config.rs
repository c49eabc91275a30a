//! Configuration loading and types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use tractatus_aws::AccountConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TRACTATUS_CONFIG";

/// Top-level configuration for tractatus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// GitHub source settings
    #[serde(default)]
    pub github: GithubConfig,
    /// AWS accounts by name
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            github: GithubConfig::default(),
            accounts: BTreeMap::new(),
        }
    }
}

/// GitHub source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Organization to inventory
    #[serde(default)]
    pub org: Option<String>,
    /// API endpoint, for GitHub Enterprise
    #[serde(default)]
    pub api_url: Option<String>,
    /// Skip archived repositories
    #[serde(default = "default_exclude_archived")]
    pub exclude_archived: bool,
    /// Repositories analyzed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            org: None,
            api_url: None,
            exclude_archived: default_exclude_archived(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_exclude_archived() -> bool {
    true
}

fn default_concurrency() -> usize {
    tractatus_github::source::DEFAULT_CONCURRENCY
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load an explicit path, else fall back to the default lookup
    ///
    /// # Errors
    /// Returns error if the chosen file cannot be read or parsed
    pub fn resolve(explicit: Option<&Path>) -> eyre::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    /// Load from default paths or use defaults
    ///
    /// # Errors
    /// Returns error if a discovered file cannot be read or parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        for path in default_paths() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "using config file");
                return Self::load(&path);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    /// Settings for a named account
    #[must_use]
    pub fn account(&self, name: &str) -> Option<&AccountConfig> {
        self.accounts.get(name)
    }
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("tractatus.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("tractatus/tractatus.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.github.exclude_archived);
        assert_eq!(config.github.concurrency, 4);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_parse_accounts_and_github() {
        let config: Config = toml::from_str(
            r#"
log_level = "debug"

[github]
org = "acme"
exclude_archived = false

[accounts.prod]
account_id = "123456789012"
region = "us-east-1"

[accounts.staging]
region = "eu-west-1"
access_key_id = "AKIAEXAMPLE"
secret_access_key = "secret"
"#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.github.org.as_deref(), Some("acme"));
        assert!(!config.github.exclude_archived);
        assert_eq!(config.accounts.len(), 2);

        let prod = config.account("prod").unwrap();
        assert_eq!(prod.region.as_deref(), Some("us-east-1"));
        assert!(prod.static_keys().is_none());

        let staging = config.account("staging").unwrap();
        assert_eq!(staging.static_keys(), Some(("AKIAEXAMPLE", "secret")));
        assert!(config.account("dev").is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github]\norg = \"initech\"\nconcurrency = 8").unwrap();

        let config = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(config.github.org.as_deref(), Some("initech"));
        assert_eq!(config.github.concurrency, 8);
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = [").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse"));
    }
}
