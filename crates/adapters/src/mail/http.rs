//! HTTP mail API adapter

use async_trait::async_trait;
use postman_domain::{MailError, MailSender, check_message, filter_receivers};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

/// Mail sender that posts JSON messages to a transactional mail API.
///
/// The sender address is the visible recipient; everyone on the roster is
/// put on Bcc so subscribers never see each other.
pub struct HttpMailSender {
    client: Client,
    api_key: SecretString,
    base_url: String,
    sender_email: String,
    sender_name: String,
}

impl HttpMailSender {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        sender_email: impl Into<String>,
        sender_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sender_email: sender_email.into(),
            sender_name: sender_name.into(),
        })
    }
}

#[derive(Serialize)]
struct SendMailRequest<'a> {
    from: Address<'a>,
    personalizations: Vec<Personalization<'a>>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    bcc: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send_mail(
        &self,
        receivers: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), MailError> {
        let receivers = filter_receivers(receivers);
        if receivers.is_empty() {
            tracing::warn!(subject, "No receivers to send mail to");
            return Ok(());
        }

        check_message(subject, body)?;

        let request = SendMailRequest {
            from: Address {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: &self.sender_email,
                    name: None,
                }],
                bcc: receivers
                    .iter()
                    .map(|email| Address { email, name: None })
                    .collect(),
            }],
            subject,
            content: vec![Content {
                kind: if is_html { "text/html" } else { "text/plain" },
                value: body,
            }],
        };

        let url = format!("{}/mail/send", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailError::Api("Request timed out".to_string())
                } else {
                    MailError::Api(e.to_string())
                }
            })?;

        if response.status() == 401 {
            return Err(MailError::Auth("Invalid API key".to_string()));
        }

        if response.status() == 429 {
            return Err(MailError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api(format!(
                "Failed to send mail ({}): {}",
                status, body
            )));
        }

        tracing::debug!(receivers = receivers.len(), subject, "Mail accepted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
