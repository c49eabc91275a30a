//! tractatus-aws: AWS tagged-resource source
//!
//! Enumerates an account's compute resources through the Resource Groups
//! Tagging API and classifies them from their tags and ARNs.

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod source;

pub use client::{RawResource, TagPage, TaggingApi, TaggingClient};
pub use config::AccountConfig;
pub use error::AwsError;
pub use source::AwsDataSource;
