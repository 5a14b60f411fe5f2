//! Configuration loading and management

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_project_nickname")]
    pub project_nickname: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_mail_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub sender_email: String,

    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    #[serde(default = "default_mail_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_daily_template")]
    pub daily_template: String,
}

// Default value functions
fn default_project_nickname() -> String {
    "postman".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./postman.sqlite")
}

fn default_mail_base_url() -> String {
    "https://api.sendgrid.com/v3".to_string()
}

fn default_sender_name() -> String {
    "Newsletter".to_string()
}

fn default_mail_api_key_env() -> String {
    "MAIL_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    50
}

fn default_max_concurrent() -> usize {
    4
}

fn default_daily_template() -> String {
    "Hello %email%,\n\nHere is today's update.\n\nTo unsubscribe use token %token%.\n"
        .to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_nickname: default_project_nickname(),
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_mail_base_url(),
            sender_email: String::new(),
            sender_name: default_sender_name(),
            api_key_env: default_mail_api_key_env(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            daily_template: default_daily_template(),
        }
    }
}

impl MailConfig {
    /// Read the API key from the configured environment variable
    pub fn load_api_key(&self) -> Result<SecretString> {
        let env_var = self.api_key_env.trim();
        if env_var.is_empty() {
            bail!("No API key env var configured for mail");
        }

        let key = std::env::var(env_var)
            .with_context(|| format!("Missing mail API key env var {}", env_var))?;

        if key.trim().is_empty() {
            bail!("Mail API key env var {} is empty", env_var);
        }

        Ok(SecretString::new(key.into()))
    }
}

/// Pick the log level: `--log-level`, then `general.log_level`, then `info`
pub fn resolve_log_level(cli_level: Option<&str>, config: Option<&AppConfig>) -> String {
    cli_level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .map(str::to_string)
        .or_else(|| {
            config
                .map(|c| c.general.log_level.trim().to_string())
                .filter(|level| !level.is_empty())
        })
        .unwrap_or_else(default_log_level)
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./postman.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("POSTMAN")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# postman configuration

[general]
# Shown in brackets at the start of daily subjects
project_nickname = "postman"
log_level = "info"

[store]
backend = "sqlite"  # sqlite, memory
sqlite_path = "./postman.sqlite"

[mail]
# When disabled, messages are logged instead of sent
enabled = false
base_url = "https://api.sendgrid.com/v3"
sender_email = "news@example.com"
sender_name = "Newsletter"
api_key_env = "MAIL_API_KEY"
timeout_secs = 30
batch_size = 50
max_concurrent = 4
daily_template = """
Hello %email%,

Here is today's update.

To unsubscribe use token %token%.
"""
"#
        .to_string()
    }
}
