//! postman CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};
use crate::config::{AppConfig, resolve_log_level};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; a broken config is reported by the command itself
    let file_config = AppConfig::load(cli.config.as_deref()).ok();
    let log_level = resolve_log_level(cli.log_level.as_deref(), file_config.as_ref());
    init_logging(&log_level)?;

    // Execute command
    match cli.command {
        Commands::Subscribe(args) => commands::subscribe::execute(args, cli.config).await,
        Commands::Unsubscribe(args) => commands::unsubscribe::execute(args, cli.config).await,
        Commands::List(args) => commands::list::execute(args, cli.config).await,
        Commands::Send(args) => commands::send::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
