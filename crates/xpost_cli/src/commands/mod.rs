//! CLI command definitions.
//!
//! Each subcommand maps to one action of the post generator: start a post,
//! refine it, inspect it, reset it, or manage the API credentials.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thiserror::Error;

use xpost_chat::{ConversationController, ConversationStore, DisplayMode, HttpBackend};
use xpost_core::ClientConfig;

pub mod chat;
pub mod feedback;
pub mod generate;
pub mod keys;
pub mod reset;
pub mod status;

/// X Post Generator - draft, refine and publish posts from a topic
#[derive(Parser, Debug)]
#[command(name = "xpost")]
#[command(version, about = "X Post Generator - draft, refine and publish posts from a topic")]
#[command(long_about = r#"
X Post Generator asks a remote backend to draft a post about a topic, lets you
refine the draft with feedback, and has the backend publish it.

WORKFLOW:
  keys set     → Store the six API credentials (sent with every request)
  generate     → Start a new post from a topic
  feedback     → Refine the draft, or reply OK / GOOD to publish it
  status       → Show the current post
  reset        → Discard the current post
  chat         → Interactive loop doing all of the above

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or no active post
  3 - Backend reported an error or skipped publishing
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (overrides settings and XPOST_BACKEND_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Request timeout in seconds (overrides settings and XPOST_TIMEOUT_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new post from a topic
    Generate(generate::GenerateArgs),

    /// Send feedback on the current draft
    Feedback(feedback::FeedbackArgs),

    /// Show the current post
    Status(status::StatusArgs),

    /// Discard the current post
    Reset,

    /// Manage API credentials
    Keys(keys::KeysArgs),

    /// Interactive generate / refine loop
    Chat,
}

/// The post did not reach a published state.
#[derive(Debug, Error)]
#[error("Post was not published ({})", .0.label())]
pub struct PostNotPublished(pub DisplayMode);

/// There is no thread to send feedback to.
#[derive(Debug, Error)]
#[error("No active post found. Start one with `xpost generate <topic>`")]
pub struct NoActivePost;

/// Resolved configuration and stores shared by every command.
pub struct AppContext {
    pub config: ClientConfig,
    pub conversations: ConversationStore,
}

impl AppContext {
    /// Resolve configuration, applying command-line overrides last.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = ClientConfig::load().context("Failed to load configuration")?;
        if let Some(url) = &cli.backend_url {
            config = config.with_backend_url(url.clone());
        }
        if let Some(secs) = cli.timeout {
            config = config.with_timeout_secs(secs);
        }
        config.validate().context("Invalid configuration")?;

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        let conversations = ConversationStore::new(&config.data_dir);
        Self {
            config,
            conversations,
        }
    }

    /// Controller over the HTTP backend, continuing the saved conversation.
    pub fn controller(&self) -> Result<ConversationController<HttpBackend>> {
        let backend = HttpBackend::from_config(&self.config).context("Failed to create backend client")?;
        let controller = ConversationController::new(backend, self.config.credential_store())
            .with_state(self.conversations.load());
        Ok(controller)
    }

    /// Persist the conversation after a transition.
    pub fn save(&self, controller: &ConversationController<HttpBackend>) -> Result<()> {
        self.conversations
            .save(controller.state())
            .context("Failed to save conversation")
    }
}

/// Map a finished transition to the command result.
pub fn finish(mode: DisplayMode) -> Result<()> {
    match mode {
        DisplayMode::Error | DisplayMode::Skipped => Err(PostNotPublished(mode).into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_topic_words() {
        let cli = Cli::try_parse_from(["xpost", "generate", "Launch", "day"]).unwrap();
        match cli.command {
            Commands::Generate(args) => assert_eq!(args.topic(), "Launch day"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "xpost",
            "status",
            "--backend-url",
            "http://localhost:8000",
            "--timeout",
            "15",
        ])
        .unwrap();

        assert_eq!(cli.backend_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cli.timeout, Some(15));
    }

    #[test]
    fn test_generate_requires_topic() {
        assert!(Cli::try_parse_from(["xpost", "generate"]).is_err());
    }

    #[test]
    fn test_finish() {
        assert!(finish(DisplayMode::Success).is_ok());
        assert!(finish(DisplayMode::NeedsFeedback).is_ok());
        let err = finish(DisplayMode::Skipped).unwrap_err();
        assert!(err.downcast_ref::<PostNotPublished>().is_some());
    }
}
