//! Dry-run mail sender that only logs

use async_trait::async_trait;
use postman_domain::{MailError, MailSender, check_message, filter_receivers};

/// Mail sender that logs each message instead of delivering it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailSender;

#[async_trait]
impl MailSender for LogMailSender {
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

        tracing::info!(
            receivers = %receivers.join(";"),
            subject,
            is_html,
            body_len = body.len(),
            "[dry-run] Would send mail"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
