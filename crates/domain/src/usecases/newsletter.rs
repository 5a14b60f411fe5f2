//! Newsletter use case - render and deliver a mail to every subscriber

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::{
    error::RegistryError,
    model::Subscriber,
    ports::{Clock, MailError, MailSender, SubscriberStore, check_message},
    usecases::registry::SubscriptionRegistry,
};

pub const EMAIL_PLACEHOLDER: &str = "%email%";
pub const TOKEN_PLACEHOLDER: &str = "%token%";

/// A message to deliver to the whole roster
#[derive(Debug, Clone)]
pub struct Newsletter {
    pub subject: String,
    /// Body text; may contain `%email%` and `%token%` placeholders
    pub template: String,
    pub is_html: bool,
}

impl Newsletter {
    pub fn new(subject: impl Into<String>, template: impl Into<String>, is_html: bool) -> Self {
        Self {
            subject: subject.into(),
            template: template.into(),
            is_html,
        }
    }

    /// Whether the body differs per subscriber
    pub fn is_personalized(&self) -> bool {
        self.template.contains(EMAIL_PLACEHOLDER) || self.template.contains(TOKEN_PLACEHOLDER)
    }

    /// Render the body for one subscriber
    pub fn render_for(&self, subscriber: &Subscriber) -> String {
        self.template
            .replace(EMAIL_PLACEHOLDER, &subscriber.email)
            .replace(TOKEN_PLACEHOLDER, &subscriber.token())
    }
}

/// Subject line for the daily mail, e.g. `[Stock Alerts] 2024-03-07`
pub fn daily_subject(nickname: &str, date: Date) -> String {
    let date = date
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string());
    format!("[{}] {}", nickname, date)
}

/// Configuration for newsletter delivery
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum receivers per message when the body is shared
    pub batch_size: usize,
    /// Maximum messages in flight when the body is personalized
    pub max_concurrent: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_concurrent: 4,
        }
    }
}

/// Outcome of a dispatch
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Subscribers the newsletter was addressed to
    pub recipients: usize,
    /// Messages accepted by the mail sender
    pub messages_sent: usize,
    /// Receivers of messages that failed, with the error
    pub failed: Vec<(Vec<String>, String)>,
}

impl DispatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Invalid newsletter: {0}")]
    Mail(#[from] MailError),
}

/// Delivers newsletters to the registry's subscribers
pub struct NewsletterDispatcher<St, Cl, M>
where
    St: SubscriberStore + ?Sized,
    Cl: Clock + ?Sized,
    M: MailSender + ?Sized,
{
    registry: Arc<SubscriptionRegistry<St, Cl>>,
    sender: Arc<M>,
    config: DispatchConfig,
}

impl<St, Cl, M> NewsletterDispatcher<St, Cl, M>
where
    St: SubscriberStore + ?Sized,
    Cl: Clock + ?Sized,
    M: MailSender + ?Sized,
{
    pub fn new(
        registry: Arc<SubscriptionRegistry<St, Cl>>,
        sender: Arc<M>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            sender,
            config,
        }
    }

    /// Send `newsletter` to every current subscriber.
    ///
    /// Individual send failures are collected in the report; store failures abort.
    pub async fn dispatch(&self, newsletter: &Newsletter) -> Result<DispatchReport, DispatchError> {
        check_message(&newsletter.subject, &newsletter.template)?;

        let subscribers = self.registry.get_subscribers().await?;
        if subscribers.is_empty() {
            tracing::warn!("No subscribers to send to");
            return Ok(DispatchReport::default());
        }

        tracing::info!(
            sender = self.sender.name(),
            recipients = subscribers.len(),
            personalized = newsletter.is_personalized(),
            "Dispatching newsletter"
        );

        let report = if newsletter.is_personalized() {
            self.send_personalized(newsletter, &subscribers).await
        } else {
            self.send_batched(newsletter, &subscribers).await
        };

        tracing::info!(
            recipients = report.recipients,
            messages_sent = report.messages_sent,
            failed = report.failed.len(),
            "Newsletter dispatch complete"
        );

        Ok(report)
    }

    async fn send_batched(
        &self,
        newsletter: &Newsletter,
        subscribers: &[Subscriber],
    ) -> DispatchReport {
        let mut report = DispatchReport {
            recipients: subscribers.len(),
            ..Default::default()
        };

        let receivers: Vec<String> = subscribers.iter().map(|s| s.email.clone()).collect();
        for batch in receivers.chunks(self.config.batch_size.max(1)) {
            match self
                .sender
                .send_mail(batch, &newsletter.subject, &newsletter.template, newsletter.is_html)
                .await
            {
                Ok(()) => report.messages_sent += 1,
                Err(e) => {
                    tracing::error!(error = %e, receivers = batch.len(), "Failed to send batch");
                    report.failed.push((batch.to_vec(), e.to_string()));
                }
            }
        }

        report
    }

    async fn send_personalized(
        &self,
        newsletter: &Newsletter,
        subscribers: &[Subscriber],
    ) -> DispatchReport {
        let mut report = DispatchReport {
            recipients: subscribers.len(),
            ..Default::default()
        };

        let results: Vec<(String, Result<(), MailError>)> = stream::iter(subscribers)
            .map(|subscriber| async move {
                let body = newsletter.render_for(subscriber);
                let receivers = [subscriber.email.clone()];
                let result = self
                    .sender
                    .send_mail(&receivers, &newsletter.subject, &body, newsletter.is_html)
                    .await;
                (subscriber.email.clone(), result)
            })
            .buffer_unordered(self.config.max_concurrent.max(1))
            .collect()
            .await;

        for (email, result) in results {
            match result {
                Ok(()) => report.messages_sent += 1,
                Err(e) => {
                    tracing::error!(email = %email, error = %e, "Failed to send newsletter");
                    report.failed.push((vec![email], e.to_string()));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use time::macros::date;

    struct FakeStore {
        rows: Vec<Subscriber>,
    }

    #[async_trait]
    impl SubscriberStore for FakeStore {
        async fn select_all_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
            Ok(self.rows.clone())
        }

        async fn add_subscriber(&self, _subscriber: &Subscriber) -> Result<(), StoreError> {
            Ok(())
        }

        async fn remove_subscriber_by_id(&self, _id: i32) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct FakeClock;

    impl Clock for FakeClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }
    }

    #[derive(Default)]
    struct FakeMailSender {
        sent: Mutex<Vec<(Vec<String>, String)>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl MailSender for FakeMailSender {
        async fn send_mail(
            &self,
            receivers: &[String],
            _subject: &str,
            body: &str,
            _is_html: bool,
        ) -> Result<(), MailError> {
            if let Some(bad) = &self.fail_for {
                if receivers.contains(bad) {
                    return Err(MailError::Api("rejected".to_string()));
                }
            }
            self.sent
                .lock()
                .unwrap()
                .push((receivers.to_vec(), body.to_string()));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn roster(emails: &[&str]) -> Vec<Subscriber> {
        emails
            .iter()
            .map(|e| Subscriber::new(*e, OffsetDateTime::UNIX_EPOCH))
            .collect()
    }

    async fn dispatcher(
        rows: Vec<Subscriber>,
        sender: Arc<FakeMailSender>,
        config: DispatchConfig,
    ) -> NewsletterDispatcher<FakeStore, FakeClock, FakeMailSender> {
        let registry = SubscriptionRegistry::load(Arc::new(FakeStore { rows }), Arc::new(FakeClock))
            .await
            .unwrap();
        NewsletterDispatcher::new(Arc::new(registry), sender, config)
    }

    #[test]
    fn test_render_for_replaces_placeholders() {
        let newsletter = Newsletter::new(
            "Daily",
            "<p>Hi %email%</p><a href=\"/unsubscribe?token=%token%\">bye</a>",
            true,
        );
        let alice = Subscriber::new("alice@example.com", OffsetDateTime::UNIX_EPOCH);

        assert!(newsletter.is_personalized());
        assert_eq!(
            newsletter.render_for(&alice),
            "<p>Hi alice@example.com</p><a href=\"/unsubscribe?token=94DB99DD\">bye</a>"
        );
    }

    #[test]
    fn test_daily_subject() {
        assert_eq!(
            daily_subject("Stock Alerts", date!(2024 - 03 - 07)),
            "[Stock Alerts] 2024-03-07"
        );
    }

    #[tokio::test]
    async fn test_shared_body_is_sent_in_batches() {
        let sender = Arc::new(FakeMailSender::default());
        let rows = roster(&["a@example.com", "b@example.com", "c@example.com"]);
        let dispatcher = dispatcher(
            rows,
            Arc::clone(&sender),
            DispatchConfig {
                batch_size: 2,
                max_concurrent: 1,
            },
        )
        .await;

        let report = dispatcher
            .dispatch(&Newsletter::new("Daily", "Same for everyone", false))
            .await
            .unwrap();

        assert_eq!(report.recipients, 3);
        assert_eq!(report.messages_sent, 2);
        assert!(report.is_complete());

        let sent = sender.sent.lock().unwrap();
        let mut sizes: Vec<usize> = sent.iter().map(|(r, _)| r.len()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_personalized_body_is_sent_per_subscriber() {
        let sender = Arc::new(FakeMailSender::default());
        let rows = roster(&["alice@example.com", "bob@example.org"]);
        let dispatcher = dispatcher(rows, Arc::clone(&sender), DispatchConfig::default()).await;

        let report = dispatcher
            .dispatch(&Newsletter::new("Daily", "token=%token%", false))
            .await
            .unwrap();

        assert_eq!(report.messages_sent, 2);

        let sent = sender.sent.lock().unwrap();
        let mut bodies: Vec<&str> = sent.iter().map(|(_, b)| b.as_str()).collect();
        bodies.sort();
        assert_eq!(bodies, vec!["token=94DB99DD", "token=98541C15"]);
    }

    #[tokio::test]
    async fn test_failures_are_collected() {
        let sender = Arc::new(FakeMailSender {
            fail_for: Some("bob@example.org".to_string()),
            ..Default::default()
        });
        let rows = roster(&["alice@example.com", "bob@example.org"]);
        let dispatcher = dispatcher(rows, Arc::clone(&sender), DispatchConfig::default()).await;

        let report = dispatcher
            .dispatch(&Newsletter::new("Daily", "Hello %email%", false))
            .await
            .unwrap();

        assert_eq!(report.messages_sent, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, vec!["bob@example.org".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_roster_sends_nothing() {
        let sender = Arc::new(FakeMailSender::default());
        let dispatcher = dispatcher(vec![], Arc::clone(&sender), DispatchConfig::default()).await;

        let report = dispatcher
            .dispatch(&Newsletter::new("Daily", "Hello", false))
            .await
            .unwrap();

        assert_eq!(report.recipients, 0);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_body_is_rejected() {
        let sender = Arc::new(FakeMailSender::default());
        let dispatcher = dispatcher(
            roster(&["alice@example.com"]),
            Arc::clone(&sender),
            DispatchConfig::default(),
        )
        .await;

        let result = dispatcher.dispatch(&Newsletter::new("Daily", "  ", false)).await;

        assert!(matches!(result, Err(DispatchError::Mail(_))));
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
