//! List command - show the roster

use anyhow::{Context, Result};
use postman_domain::Subscriber;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::ListArgs;
use crate::commands::open_registry;
use crate::config::AppConfig;

/// JSON view of the roster
#[derive(Debug, Serialize)]
struct RosterOutput<'a> {
    count: usize,
    subscribers: Vec<ListedSubscriber<'a>>,
}

#[derive(Debug, Serialize)]
struct ListedSubscriber<'a> {
    #[serde(flatten)]
    subscriber: &'a Subscriber,
    token: String,
}

impl<'a> RosterOutput<'a> {
    fn new(subscribers: &'a [Subscriber]) -> Self {
        Self {
            count: subscribers.len(),
            subscribers: subscribers
                .iter()
                .map(|subscriber| ListedSubscriber {
                    subscriber,
                    token: subscriber.token(),
                })
                .collect(),
        }
    }
}

pub async fn execute(args: ListArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let registry = open_registry(&config).await?;

    let subscribers = registry
        .get_subscribers()
        .await
        .context("Failed to read subscribers")?;

    if args.json {
        let output = RosterOutput::new(&subscribers);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Subscribers ({} found)", subscribers.len());
        println!("========================");
        for subscriber in &subscribers {
            println!(
                "{}  {}  {}",
                subscriber.token(),
                subscriber.email,
                subscriber.subscribed_at
            );
        }
    }

    Ok(())
}
