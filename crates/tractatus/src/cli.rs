use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::output::{Destination, Format};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "tractatus",
    version,
    about = "Inventory cloud resources and source repositories",
    long_about = None
)]
pub struct Cli {
    /// Data source: github, aws
    #[arg(long, default_value = "github")]
    pub source: String,

    /// GitHub organization name
    #[arg(long)]
    pub github_org: Option<String>,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Exclude archived repositories [default: true]
    #[arg(long, action = ArgAction::Set)]
    pub exclude_archived: Option<bool>,

    /// AWS account name(s) from config, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub account: Vec<String>,

    /// Use AWS shared credential profiles instead of configured keys
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub use_profile: bool,

    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Output destination: stdout or a file path
    #[arg(long, default_value = "stdout")]
    pub output: Destination,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Account names with surrounding whitespace and empties removed
    #[must_use]
    pub fn accounts(&self) -> Vec<String> {
        self.account
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tractatus"]).unwrap();
        assert_eq!(cli.source, "github");
        assert!(cli.use_profile);
        assert!(cli.exclude_archived.is_none());
        assert_eq!(cli.format, Format::Table);
        assert_eq!(cli.output, Destination::Stdout);
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn test_multi_account_fan_out() {
        let cli = Cli::try_parse_from([
            "tractatus",
            "--source",
            "aws",
            "--account",
            "prod, staging,,dev",
            "--use-profile",
            "false",
        ])
        .unwrap();

        assert_eq!(cli.accounts(), ["prod", "staging", "dev"]);
        assert!(!cli.use_profile);
    }

    #[test]
    fn test_markdown_to_file() {
        let cli = Cli::try_parse_from([
            "tractatus",
            "--format",
            "markdown",
            "--output",
            "inventory.md",
            "--exclude-archived",
            "false",
        ])
        .unwrap();

        assert_eq!(cli.format, Format::Markdown);
        assert_eq!(cli.output, Destination::File(PathBuf::from("inventory.md")));
        assert_eq!(cli.exclude_archived, Some(false));
    }
}
