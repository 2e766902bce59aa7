//! Docgate CLI
//!
//! Command-line interface for ACL provisioning and filtered search
//! administration.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docgate_cli::cli::{Cli, Command};
use docgate_cli::{commands, config_handlers};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Provision(args) => commands::handle_provision(config_path, args).await?,
        Command::Index { action } => commands::handle_index(config_path, action).await?,
        Command::Search { action } => commands::handle_search(config_path, action).await?,
        Command::Config { action } => config_handlers::handle_config(config_path, action)?,
    }

    Ok(())
}
