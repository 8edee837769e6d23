//! Switchboard - Routes chat turns to specialized remote agents

mod agent;
mod cli;
mod config;
mod llm;
mod protocol;
mod remote;
mod router;
mod server;
mod session;
mod weather;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging
    let filter = match cli.log_filter() {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "switchboard=debug,info".into()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Switchboard v{}", env!("CARGO_PKG_VERSION"));

    // Run CLI
    cli::run(cli)?;

    Ok(())
}
