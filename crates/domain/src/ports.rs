//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::Subscriber;

/// Error type for subscriber store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Duplicate subscriber: id {id}, email {email}")]
    Duplicate { id: i32, email: String },
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Port for durable subscriber storage
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Fetch every persisted subscriber
    async fn select_all_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// Insert a subscriber; fails on a duplicate id or email
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<(), StoreError>;

    /// Delete a subscriber by id; deleting an absent id succeeds
    async fn remove_subscriber_by_id(&self, id: i32) -> Result<(), StoreError>;
}

/// Error type for mail delivery
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail API error: {0}")]
    Api(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// Port for outbound mail
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Send one message to every non-blank receiver.
    ///
    /// An empty receiver list after filtering is logged and treated as success.
    async fn send_mail(
        &self,
        receivers: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), MailError>;

    /// Sender name for logs (e.g., "http", "log")
    fn name(&self) -> &'static str;
}

/// Drop blank receivers and trim the rest
pub fn filter_receivers(receivers: &[String]) -> Vec<String> {
    receivers
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reject messages with a blank subject or body
pub fn check_message(subject: &str, body: &str) -> Result<(), MailError> {
    if subject.trim().is_empty() {
        return Err(MailError::InvalidMessage("subject is empty".to_string()));
    }
    if body.trim().is_empty() {
        return Err(MailError::InvalidMessage("body is empty".to_string()));
    }
    Ok(())
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation, local time when the offset is known
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}
