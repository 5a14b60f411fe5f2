//! Subscription registry - the roster of subscribers and pending confirmations
//!
//! The registry owns the in-memory index of subscribers keyed by id and keeps it
//! consistent with a [`SubscriberStore`]. Every check-then-mutate sequence runs
//! under the index lock, with the store write happening before the index is
//! touched, so a failed write never leaves the two out of step.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use tokio::sync::Mutex;
use validator::validate_email;

use crate::{
    error::RegistryError,
    model::{Subscriber, parse_token},
    ports::{Clock, SubscriberStore},
};

/// In-process subscriber roster backed by a durable store
pub struct SubscriptionRegistry<St, Cl>
where
    St: SubscriberStore + ?Sized,
    Cl: Clock + ?Sized,
{
    store: Arc<St>,
    clock: Arc<Cl>,
    subscribers: Mutex<HashMap<i32, Subscriber>>,
    pending: std::sync::Mutex<HashMap<String, String>>,
}

impl<St, Cl> SubscriptionRegistry<St, Cl>
where
    St: SubscriberStore + ?Sized,
    Cl: Clock + ?Sized,
{
    /// Create a registry with an empty index
    pub fn new(store: Arc<St>, clock: Arc<Cl>) -> Self {
        Self {
            store,
            clock,
            subscribers: Mutex::new(HashMap::new()),
            pending: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry and populate its index from the store
    pub async fn load(store: Arc<St>, clock: Arc<Cl>) -> Result<Self, RegistryError> {
        let registry = Self::new(store, clock);
        registry.refresh().await?;
        Ok(registry)
    }

    /// Add a new subscriber for `email`
    pub async fn subscribe(&self, email: &str) -> Result<Subscriber, RegistryError> {
        let result = self.try_subscribe(email).await;
        if let Err(e) = &result {
            log_failure("subscribe", email, e);
        }
        result
    }

    async fn try_subscribe(&self, email: &str) -> Result<Subscriber, RegistryError> {
        let email = check_email(email)?;
        let subscriber = Subscriber::new(email, self.clock.now());

        let mut subscribers = self.subscribers.lock().await;
        if subscribers.contains_key(&subscriber.id) {
            return Err(RegistryError::AlreadySubscribed {
                email: email.to_string(),
            });
        }

        self.store.add_subscriber(&subscriber).await?;
        subscribers.insert(subscriber.id, subscriber.clone());

        tracing::info!(
            email = %subscriber.email,
            id = subscriber.id,
            total = subscribers.len(),
            "Subscribed"
        );

        Ok(subscriber)
    }

    /// Remove the subscriber whose id is encoded in `token`.
    ///
    /// The token alone authorizes removal; `email` is only validated.
    pub async fn unsubscribe(&self, email: &str, token: &str) -> Result<Subscriber, RegistryError> {
        let result = self.try_unsubscribe(email, token).await;
        if let Err(e) = &result {
            log_failure("unsubscribe", email, e);
        }
        result
    }

    async fn try_unsubscribe(&self, email: &str, token: &str) -> Result<Subscriber, RegistryError> {
        let email = check_email(email)?;
        let id = parse_token(token)?;

        let mut subscribers = self.subscribers.lock().await;
        if !subscribers.contains_key(&id) {
            return Err(RegistryError::NotSubscribed {
                email: email.to_string(),
            });
        }

        self.store.remove_subscriber_by_id(id).await?;
        let removed = subscribers
            .remove(&id)
            .ok_or_else(|| RegistryError::NotSubscribed {
                email: email.to_string(),
            })?;

        tracing::info!(
            email = %removed.email,
            id = removed.id,
            total = subscribers.len(),
            "Unsubscribed"
        );

        Ok(removed)
    }

    /// Register `subscriber.token()` as the pending confirmation code for its email,
    /// replacing any earlier one
    pub fn add_to_auth(&self, subscriber: &Subscriber) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.insert(subscriber.email.clone(), subscriber.token());
        tracing::debug!(email = %subscriber.email, "Confirmation pending");
    }

    /// Consume the pending confirmation for `email` if `token` matches it exactly.
    ///
    /// A mismatch leaves the entry in place.
    pub fn auth(&self, email: &str, token: &str) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.get(email) {
            Some(expected) if expected == token => {
                pending.remove(email);
                tracing::debug!(email = %email, "Confirmation consumed");
                true
            }
            _ => false,
        }
    }

    /// Reload from the store, then return every subscriber ordered by id
    pub async fn get_subscribers(&self) -> Result<Vec<Subscriber>, RegistryError> {
        let mut subscribers = self.subscribers.lock().await;
        self.update_subscriber_table(&mut subscribers).await?;

        let mut values: Vec<Subscriber> = subscribers.values().cloned().collect();
        values.sort_by_key(|s| s.id);
        Ok(values)
    }

    /// Reload the index from the store
    pub async fn refresh(&self) -> Result<(), RegistryError> {
        let mut subscribers = self.subscribers.lock().await;
        self.update_subscriber_table(&mut subscribers).await
    }

    /// Number of indexed subscribers
    pub async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Whether the index holds no subscribers
    pub async fn is_empty(&self) -> bool {
        self.subscribers.lock().await.is_empty()
    }

    /// Whether the id derived from `email` is indexed
    pub async fn is_subscribed(&self, email: &str) -> bool {
        let id = crate::hash::sdbm_lower(email.trim());
        self.subscribers.lock().await.contains_key(&id)
    }

    /// Rebuild the index only when the store returned rows, so a transient
    /// empty read never wipes local state.
    async fn update_subscriber_table(
        &self,
        subscribers: &mut HashMap<i32, Subscriber>,
    ) -> Result<(), RegistryError> {
        let rows = self.store.select_all_subscribers().await?;

        if rows.is_empty() {
            tracing::debug!(
                indexed = subscribers.len(),
                "Store returned no subscribers, keeping index"
            );
            return Ok(());
        }

        subscribers.clear();
        for subscriber in rows {
            subscribers.insert(subscriber.id, subscriber);
        }

        tracing::debug!(indexed = subscribers.len(), "Subscriber index refreshed");
        Ok(())
    }
}

fn check_email(email: &str) -> Result<&str, RegistryError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(RegistryError::BlankEmail);
    }
    if !validate_email(email) {
        return Err(RegistryError::InvalidEmail(email.to_string()));
    }
    Ok(email)
}

fn log_failure(operation: &str, email: &str, error: &RegistryError) {
    if error.is_rejection() {
        tracing::warn!(operation, email = %email, kind = ?error.kind(), "{}", error);
    } else {
        tracing::error!(operation, email = %email, error = %error, "Store failure");
    }
}
