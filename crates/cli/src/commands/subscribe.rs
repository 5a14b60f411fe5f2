//! Subscribe command - add addresses to the roster

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::args::SubscribeArgs;
use crate::commands::{open_registry, split_addresses};
use crate::config::AppConfig;

pub async fn execute(args: SubscribeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let registry = open_registry(&config).await?;

    let mut failures = 0;
    for email in split_addresses(&args.emails) {
        match registry.subscribe(&email).await {
            Ok(subscriber) => println!("✓ Subscribed {}", subscriber),
            Err(e) if e.is_rejection() => println!("✗ {}: {}", email, e),
            Err(e) => {
                eprintln!("✗ {}: {}", email, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} subscription(s) failed to persist", failures);
    }

    Ok(())
}
