//! Recording mail sender for adapter tests

use async_trait::async_trait;
use postman_domain::{MailError, MailSender, filter_receivers};
use std::sync::{Mutex, PoisonError};

/// A message captured by [`StubMailSender`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub receivers: Vec<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

/// Stub sender that records messages and can be told to fail
#[derive(Default)]
pub struct StubMailSender {
    sent: Mutex<Vec<SentMail>>,
    fail_with: Option<String>,
}

impl StubMailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stub whose every send fails with an API error
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Messages recorded so far
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MailSender for StubMailSender {
    async fn send_mail(
        &self,
        receivers: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), MailError> {
        if let Some(ref message) = self.fail_with {
            return Err(MailError::Api(message.clone()));
        }

        let receivers = filter_receivers(receivers);
        if receivers.is_empty() {
            tracing::warn!(subject, "No receivers to send mail to");
            return Ok(());
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMail {
                receivers,
                subject: subject.to_string(),
                body: body.to_string(),
                is_html,
            });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySubscriberStore;
    use postman_domain::{
        DispatchConfig, Newsletter, NewsletterDispatcher, SubscriptionRegistry, SystemClock,
    };
    use std::sync::Arc;

    async fn registry_with(
        emails: &[&str],
    ) -> Arc<SubscriptionRegistry<InMemorySubscriberStore, SystemClock>> {
        let registry = SubscriptionRegistry::new(
            Arc::new(InMemorySubscriberStore::new()),
            Arc::new(SystemClock),
        );
        for email in emails {
            registry.subscribe(email).await.unwrap();
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_stub_records_filtered_receivers() {
        let stub = StubMailSender::new();
        stub.send_mail(
            &["a@example.com".to_string(), "".to_string()],
            "Hi",
            "Body",
            true,
        )
        .await
        .unwrap();

        let sent = stub.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].receivers, vec!["a@example.com".to_string()]);
        assert!(sent[0].is_html);
    }

    #[tokio::test]
    async fn test_dispatch_batches_through_stub() {
        let registry = registry_with(&["a@example.com", "b@example.com", "c@example.com"]).await;
        let stub = Arc::new(StubMailSender::new());
        let dispatcher = NewsletterDispatcher::new(
            registry,
            Arc::clone(&stub),
            DispatchConfig {
                batch_size: 2,
                max_concurrent: 1,
            },
        );

        let report = dispatcher
            .dispatch(&Newsletter::new("News", "Same for all", false))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.recipients, 3);
        assert_eq!(report.messages_sent, 2);
        let sizes: Vec<usize> = stub.sent().iter().map(|m| m.receivers.len()).collect();
        assert_eq!(sizes, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_dispatch_reports_failures() {
        let registry = registry_with(&["a@example.com"]).await;
        let dispatcher = NewsletterDispatcher::new(
            registry,
            Arc::new(StubMailSender::failing("down")),
            DispatchConfig::default(),
        );

        let report = dispatcher
            .dispatch(&Newsletter::new("News", "Body", false))
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.messages_sent, 0);
        assert_eq!(report.failed[0].0, vec!["a@example.com".to_string()]);
    }
}
