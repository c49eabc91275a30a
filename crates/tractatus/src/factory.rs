//! Data source factory

use std::sync::Arc;

use eyre::{Result, bail};
use tractatus_aws::AwsDataSource;
use tractatus_github::{GithubClient, GithubDataSource};
use tractatus_inventory::{DataSource, SourceKind};

use crate::config::Config;

/// Command-line choices that shape the data sources
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Backend to inventory
    pub kind: SourceKind,
    /// Organization, overriding the config file
    pub github_org: Option<String>,
    /// Personal access token
    pub github_token: Option<String>,
    /// Skip archived repositories, overriding the config file
    pub exclude_archived: Option<bool>,
    /// AWS account names, one source each
    pub accounts: Vec<String>,
    /// Take AWS credentials from shared profiles
    pub use_profile: bool,
}

/// Build every data source selected by the options
///
/// GitHub yields a single source; AWS yields one source per account.
///
/// # Errors
/// Returns error if a required setting is missing or a client cannot be built
pub fn build_sources(options: &SourceOptions, config: &Config) -> Result<Vec<Arc<dyn DataSource>>> {
    match options.kind {
        SourceKind::Github => Ok(vec![github_source(options, config)?]),
        SourceKind::Aws => aws_sources(options, config),
    }
}

fn github_source(options: &SourceOptions, config: &Config) -> Result<Arc<dyn DataSource>> {
    let Some(token) = options.github_token.as_deref().filter(|t| !t.is_empty()) else {
        bail!("GitHub token required. Use --github-token or set GITHUB_TOKEN");
    };
    let Some(org) = options
        .github_org
        .as_deref()
        .or(config.github.org.as_deref())
        .filter(|o| !o.is_empty())
    else {
        bail!("GitHub organization required. Use --github-org or set github.org in the config file");
    };

    let client = match &config.github.api_url {
        Some(url) => GithubClient::with_base_url(url, token, org)?,
        None => GithubClient::new(token, org)?,
    };
    let exclude_archived = options
        .exclude_archived
        .unwrap_or(config.github.exclude_archived);

    tracing::info!(org, exclude_archived, "collecting inventory from GitHub organization");

    let source = GithubDataSource::new(Arc::new(client), exclude_archived)
        .with_concurrency(config.github.concurrency);
    Ok(Arc::new(source))
}

fn aws_sources(options: &SourceOptions, config: &Config) -> Result<Vec<Arc<dyn DataSource>>> {
    if options.accounts.is_empty() {
        bail!("--account is required for the AWS source");
    }

    let mut sources: Vec<Arc<dyn DataSource>> = Vec::with_capacity(options.accounts.len());
    for name in &options.accounts {
        let account = match config.account(name) {
            Some(account) => account.clone(),
            // Profile credentials and region come from the environment
            None if options.use_profile => Default::default(),
            None => bail!("account '{name}' not found in config"),
        };

        tracing::info!(account = %name, use_profile = options.use_profile, "collecting inventory from AWS account");
        sources.push(Arc::new(AwsDataSource::new(
            name.clone(),
            account,
            options.use_profile,
        )));
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use tractatus_aws::AccountConfig;

    use super::*;

    fn options(kind: SourceKind) -> SourceOptions {
        SourceOptions {
            kind,
            github_org: None,
            github_token: None,
            exclude_archived: None,
            accounts: Vec::new(),
            use_profile: true,
        }
    }

    #[test]
    fn test_github_requires_token() {
        let opts = SourceOptions {
            github_org: Some("acme".to_string()),
            ..options(SourceKind::Github)
        };
        let Err(err) = build_sources(&opts, &Config::default()) else {
            panic!("expected a missing token error");
        };
        assert!(err.to_string().contains("token required"));
    }

    #[test]
    fn test_github_org_from_config() {
        let mut config = Config::default();
        config.github.org = Some("acme".to_string());
        let opts = SourceOptions {
            github_token: Some("ghp_x".to_string()),
            ..options(SourceKind::Github)
        };

        let sources = build_sources(&opts, &config).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "GitHub");
        assert_eq!(sources[0].target(), "acme");
    }

    #[test]
    fn test_github_requires_org() {
        let opts = SourceOptions {
            github_token: Some("ghp_x".to_string()),
            ..options(SourceKind::Github)
        };
        assert!(build_sources(&opts, &Config::default()).is_err());
    }

    #[test]
    fn test_aws_one_source_per_account() {
        let opts = SourceOptions {
            accounts: vec!["prod".to_string(), "staging".to_string()],
            ..options(SourceKind::Aws)
        };

        let sources = build_sources(&opts, &Config::default()).unwrap();
        let targets: Vec<_> = sources.iter().map(|s| s.target()).collect();
        assert_eq!(targets, ["prod", "staging"]);
        assert!(sources.iter().all(|s| s.name() == "AWS"));
    }

    #[test]
    fn test_aws_requires_accounts() {
        assert!(build_sources(&options(SourceKind::Aws), &Config::default()).is_err());
    }

    #[test]
    fn test_aws_static_keys_need_configured_account() {
        let mut config = Config::default();
        config
            .accounts
            .insert("prod".to_string(), AccountConfig::with_region("us-east-1"));
        let opts = SourceOptions {
            accounts: vec!["prod".to_string(), "dev".to_string()],
            use_profile: false,
            ..options(SourceKind::Aws)
        };

        let Err(err) = build_sources(&opts, &config) else {
            panic!("expected a missing account error");
        };
        assert_eq!(err.to_string(), "account 'dev' not found in config");
    }
}
