//! Unsubscribe command - remove addresses from the roster

use anyhow::{Result, bail};
use postman_domain::{format_token, sdbm_lower};
use std::path::PathBuf;

use crate::args::UnsubscribeArgs;
use crate::commands::{open_registry, split_addresses};
use crate::config::AppConfig;

pub async fn execute(args: UnsubscribeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let registry = open_registry(&config).await?;

    let mut failures = 0;
    for email in split_addresses(&args.emails) {
        let token = args
            .token
            .clone()
            .unwrap_or_else(|| format_token(sdbm_lower(email.as_str())));

        match registry.unsubscribe(&email, &token).await {
            Ok(subscriber) => println!("✓ Unsubscribed {}", subscriber),
            Err(e) if e.is_rejection() => println!("✗ {}: {}", email, e),
            Err(e) => {
                eprintln!("✗ {}: {}", email, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} removal(s) failed to persist", failures);
    }

    Ok(())
}
