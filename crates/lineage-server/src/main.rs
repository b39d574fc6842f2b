//! Lineage server binary
//!
//! Starts the REST API over a SQLite tree store.

use anyhow::Context;
use clap::Parser;
use lineage_server::{cli::Cli, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.config.is_none() {
        eprintln!("Warning: No config file specified, using defaults");
        eprintln!("Usage: lineage-server --config <path-to-config.toml>");
        eprintln!();
    }

    let config = cli.resolve_config().context("Failed to load configuration")?;
    start_server(config).await.context("Server terminated with an error")?;

    Ok(())
}
