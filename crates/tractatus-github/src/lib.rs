//! tractatus-github: GitHub organization source
//!
//! Lists an organization's repositories, inspects their file layout and
//! CODEOWNERS, and classifies each one into an inventory record.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tractatus_github::{GithubClient, GithubDataSource};
//! use tractatus_inventory::Collector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GithubClient::new("ghp_token", "acme")?;
//! let source = GithubDataSource::new(Arc::new(client), true);
//!
//! let inventory = Collector::new().collect_from_source(&source).await?;
//! println!("{} repositories", inventory.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod detector;
pub mod error;
pub mod source;

pub use client::{CommitInfo, GithubApi, GithubClient, RepoSummary, Repository};
pub use error::{GithubError, Result};
pub use source::GithubDataSource;
