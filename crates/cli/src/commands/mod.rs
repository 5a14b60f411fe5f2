//! Subcommand implementations

pub mod config;
pub mod list;
pub mod send;
pub mod subscribe;
pub mod unsubscribe;

use anyhow::{Context, Result};
use postman_adapters::store::{InMemorySubscriberStore, SqliteSubscriberStore};
use postman_domain::{SubscriberStore, SubscriptionRegistry, SystemClock};
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};

pub(crate) type Registry = SubscriptionRegistry<dyn SubscriberStore, SystemClock>;

/// Open the configured store and load the roster from it
pub(crate) async fn open_registry(config: &AppConfig) -> Result<Registry> {
    let store: Arc<dyn SubscriberStore> = match config.store.backend {
        StoreBackend::Sqlite => Arc::new(
            SqliteSubscriberStore::new(&config.store.sqlite_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open subscriber database: {}",
                        config.store.sqlite_path.display()
                    )
                })?,
        ),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; changes are lost when the process exits");
            Arc::new(InMemorySubscriberStore::new())
        }
    };

    SubscriptionRegistry::load(store, Arc::new(SystemClock))
        .await
        .context("Failed to load subscribers")
}

/// Split each argument on ';' and drop blank entries
pub(crate) fn split_addresses(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(';'))
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_addresses() {
        let args = vec![
            "a@example.com;b@example.com".to_string(),
            " c@example.com ;;".to_string(),
        ];
        assert_eq!(
            split_addresses(&args),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }
}
