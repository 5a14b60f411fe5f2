//! In-memory subscriber store for testing and offline mode

use async_trait::async_trait;
use postman_domain::{StoreError, Subscriber, SubscriberStore};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// In-memory subscriber store with the same uniqueness rules as the SQL table
pub struct InMemorySubscriberStore {
    rows: RwLock<BTreeMap<i32, Subscriber>>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    /// Drop every row
    #[cfg(test)]
    fn clear(&self) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        rows.clear();
        Ok(())
    }
}

impl Default for InMemorySubscriberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn select_all_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(rows.values().cloned().collect())
    }

    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        if rows.contains_key(&subscriber.id) || rows.values().any(|r| r.email == subscriber.email) {
            return Err(StoreError::Duplicate {
                id: subscriber.id,
                email: subscriber.email.clone(),
            });
        }

        rows.insert(subscriber.id, subscriber.clone());
        Ok(())
    }

    async fn remove_subscriber_by_id(&self, id: i32) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        rows.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postman_domain::SubscriptionRegistry;
    use postman_domain::SystemClock;
    use std::sync::Arc;

    fn subscriber(id: i32, email: &str) -> Subscriber {
        Subscriber::restore(id, email, "3/7/2024 9:05:02 PM")
    }

    #[tokio::test]
    async fn test_add_and_select() {
        let store = InMemorySubscriberStore::new();

        store.add_subscriber(&subscriber(2, "b@example.com")).await.unwrap();
        store.add_subscriber(&subscriber(1, "a@example.com")).await.unwrap();

        let rows = store.select_all_subscribers().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].email, "b@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_id_and_email_rejected() {
        let store = InMemorySubscriberStore::new();
        store.add_subscriber(&subscriber(1, "a@example.com")).await.unwrap();

        let same_id = store.add_subscriber(&subscriber(1, "other@example.com")).await;
        assert!(matches!(same_id, Err(StoreError::Duplicate { id: 1, .. })));

        let same_email = store.add_subscriber(&subscriber(9, "a@example.com")).await;
        assert!(matches!(same_email, Err(StoreError::Duplicate { id: 9, .. })));

        assert_eq!(store.select_all_subscribers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_absent_is_ok() {
        let store = InMemorySubscriberStore::new();
        store.add_subscriber(&subscriber(1, "a@example.com")).await.unwrap();

        store.remove_subscriber_by_id(42).await.unwrap();
        store.remove_subscriber_by_id(1).await.unwrap();
        store.remove_subscriber_by_id(1).await.unwrap();

        assert!(store.select_all_subscribers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleared_store_keeps_registry_index() {
        let store = Arc::new(InMemorySubscriberStore::new());
        let registry = SubscriptionRegistry::new(Arc::clone(&store), Arc::new(SystemClock));
        registry.subscribe("alice@example.com").await.unwrap();

        store.clear().unwrap();

        let subscribers = registry.get_subscribers().await.unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers[0].email, "alice@example.com");
    }
}
