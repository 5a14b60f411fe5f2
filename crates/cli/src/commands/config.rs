//! Config command - configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
        ConfigCommands::Show => show_config(config_path).await,
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set mail.sender_email and export the API key named by mail.api_key_env");
    println!("  2. Run 'postman subscribe you@example.com' to add a subscriber");
    println!("  3. Run 'postman send --daily --dry-run' to preview a send");

    Ok(())
}

async fn show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    print!("{}", config.to_toml()?);

    let key_state = if std::env::var(&config.mail.api_key_env)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
    {
        "set"
    } else {
        "not set"
    };
    println!();
    println!("# {} is {}", config.mail.api_key_env, key_state);

    Ok(())
}
