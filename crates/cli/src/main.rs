//! reqlog command-line entry point.
//!
//! Opens the history store described by the layered configuration and runs one
//! command against it. Results are printed as JSON on stdout; logging goes to
//! stderr so output stays machine-readable.

use anyhow::{Context, Result};
use clap::Parser;
use reqlog_core::{AppConfig, CacheStore, Store};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
        config.in_memory = false;
    }

    tracing::debug!(db_path = %config.db_path.display(), in_memory = config.in_memory, "opening history store");
    let store = Store::open_with_config(&config)
        .await
        .with_context(|| format!("failed to open history store at {}", config.db_path.display()))?;
    let cache = CacheStore::new(store);

    let output = commands::run(&cache, &config, cli.command).await;
    cache.close().await.context("failed to close history store")?;

    println!("{}", output?);
    Ok(())
}
