//! tractatus
//!
//! Collects a unified inventory of AWS resources or GitHub repositories and
//! renders it as a table or a Markdown report.

use std::io;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tractatus_inventory::{Collector, Inventory, InventoryError, SourceKind};

mod cli;
mod config;
mod factory;
mod output;

use cli::{Cli, LogFormat};
use config::Config;
use factory::SourceOptions;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = Config::resolve(cli.config.as_deref()).wrap_err("failed to load configuration")?;
    init_tracing(
        cli.log_level.as_deref().unwrap_or(&config.log_level),
        cli.log_format,
    );

    let kind: SourceKind = cli.source.parse()?;
    let options = SourceOptions {
        kind,
        github_org: cli.github_org.clone(),
        github_token: cli.github_token.clone(),
        exclude_archived: cli.exclude_archived,
        accounts: cli.accounts(),
        use_profile: cli.use_profile,
    };
    let sources = factory::build_sources(&options, &config)?;

    let collector = Collector::new();
    let cancel = collector.cancel_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling collection");
            cancel.cancel();
        }
    });

    let inventory = if sources.len() == 1 {
        let inventory = collector.collect_from_source(sources[0].as_ref()).await?;
        if inventory.is_empty() {
            return Err(InventoryError::NoResources.into());
        }
        inventory
    } else {
        collector.collect_from_targets(sources).await.into_inventory()?
    };

    output::write_inventory(&inventory, cli.format, &cli.output)
        .wrap_err("failed to write output")?;

    report(&inventory, kind);
    Ok(())
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries rendered output
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}

fn report(inventory: &Inventory, kind: SourceKind) {
    info!(resources = inventory.len(), source = %kind, "inventory written");
    eprintln!(
        "\nSuccessfully processed {} resources from {kind}",
        inventory.len()
    );
}
