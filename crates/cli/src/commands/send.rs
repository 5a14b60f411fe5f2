//! Send command - deliver a newsletter to every subscriber

use anyhow::{Context, Result, bail};
use postman_adapters::mail::{HttpMailSender, LogMailSender};
use postman_domain::{
    Clock, DispatchConfig, MailSender, Newsletter, NewsletterDispatcher, SystemClock,
    daily_subject,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::args::SendArgs;
use crate::commands::open_registry;
use crate::config::{AppConfig, MailConfig};

pub async fn execute(args: SendArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let newsletter = build_newsletter(&args, &config)?;
    let dry_run = args.dry_run || !config.mail.enabled;
    let sender = build_sender(&config.mail, dry_run)?;

    tracing::info!(
        subject = %newsletter.subject,
        sender = sender.name(),
        dry_run,
        "Preparing newsletter"
    );

    let registry = Arc::new(open_registry(&config).await?);
    let dispatcher = NewsletterDispatcher::new(
        registry,
        sender,
        DispatchConfig {
            batch_size: config.mail.batch_size,
            max_concurrent: config.mail.max_concurrent,
        },
    );

    let report = dispatcher
        .dispatch(&newsletter)
        .await
        .context("Failed to dispatch newsletter")?;

    println!(
        "Sent {} message(s) to {} subscriber(s){}",
        report.messages_sent,
        report.recipients,
        if dry_run { " (dry run)" } else { "" }
    );

    if !report.is_complete() {
        for (receivers, error) in &report.failed {
            eprintln!("✗ {}: {}", receivers.join(";"), error);
        }
        bail!("{} message(s) failed to send", report.failed.len());
    }

    Ok(())
}

fn build_newsletter(args: &SendArgs, config: &AppConfig) -> Result<Newsletter> {
    if args.daily {
        let today = SystemClock.now().date();
        return Ok(Newsletter::new(
            daily_subject(&config.general.project_nickname, today),
            config.mail.daily_template.clone(),
            args.html,
        ));
    }

    let subject = args
        .subject
        .clone()
        .context("A subject is required unless --daily is given")?;

    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => read_body(path)?,
        (None, None) => bail!("Either --body or --body-file is required"),
    };

    Ok(Newsletter::new(subject, body, args.html))
}

fn read_body(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read body from stdin")?;
        return Ok(buffer);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read body file: {}", path.display()))
}

fn build_sender(config: &MailConfig, dry_run: bool) -> Result<Arc<dyn MailSender>> {
    if dry_run {
        return Ok(Arc::new(LogMailSender));
    }

    if config.sender_email.trim().is_empty() {
        bail!("mail.sender_email must be set to send mail");
    }

    let api_key = config.load_api_key()?;
    let sender = HttpMailSender::new(
        api_key,
        config.base_url.clone(),
        config.sender_email.clone(),
        config.sender_name.clone(),
        Duration::from_secs(config.timeout_secs),
    )
    .context("Failed to initialize mail sender")?;

    Ok(Arc::new(sender))
}
