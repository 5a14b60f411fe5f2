//! CLI argument definitions

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// postman: manage a newsletter subscriber roster and mail it
#[derive(Parser, Debug)]
#[command(name = "postman")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add addresses to the roster
    Subscribe(SubscribeArgs),

    /// Remove addresses from the roster
    Unsubscribe(UnsubscribeArgs),

    /// Show the current roster
    List(ListArgs),

    /// Send a newsletter to every subscriber
    Send(SendArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct SubscribeArgs {
    /// Addresses to subscribe (several may be joined with ';')
    #[arg(required = true)]
    pub emails: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UnsubscribeArgs {
    /// Addresses to unsubscribe (several may be joined with ';')
    #[arg(required = true)]
    pub emails: Vec<String>,

    /// Unsubscribe token; derived from each address when omitted
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("content").required(true).args(["body", "body_file", "daily"])))]
pub struct SendArgs {
    /// Message subject
    #[arg(long, required_unless_present = "daily", conflicts_with = "daily")]
    pub subject: Option<String>,

    /// Message body (may contain %email% and %token% placeholders)
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// File containing the message body (use - for stdin)
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Treat the body as HTML
    #[arg(long)]
    pub html: bool,

    /// Send the configured daily newsletter
    #[arg(long)]
    pub daily: bool,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./postman.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_send_requires_content() {
        assert!(Cli::try_parse_from(["postman", "send", "--subject", "Hi"]).is_err());
        assert!(Cli::try_parse_from(["postman", "send", "--subject", "Hi", "--body", "B"]).is_ok());
        assert!(Cli::try_parse_from(["postman", "send", "--daily"]).is_ok());
        assert!(
            Cli::try_parse_from(["postman", "send", "--daily", "--subject", "Hi"]).is_err()
        );
    }
}
