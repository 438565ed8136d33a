//! X Post Generator CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or no active post
//! - 3: Backend reported an error or skipped publishing

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod render;

use commands::{AppContext, Cli, Commands, NoActivePost, PostNotPublished};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const POST_NOT_PUBLISHED: u8 = 3;
}

const DEFAULT_FILTER: &str = "xpost_core=info,xpost_chat=info,xpost_cli=info,warn";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = AppContext::load(&cli)?;

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &ctx).await,
        Commands::Feedback(args) => commands::feedback::execute(args, &ctx).await,
        Commands::Status(args) => commands::status::execute(args, &ctx).await,
        Commands::Reset => commands::reset::execute(&ctx).await,
        Commands::Keys(args) => commands::keys::execute(args, &ctx).await,
        Commands::Chat => commands::chat::execute(&ctx).await,
    }
}

/// Logs go to stderr so command output stays clean.
fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        EnvFilter::new("xpost_core=debug,xpost_chat=debug,xpost_cli=debug,warn")
    } else if cli.quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<PostNotPublished>().is_some() {
        return ExitCodes::POST_NOT_PUBLISHED;
    }
    if e.downcast_ref::<NoActivePost>().is_some() {
        return ExitCodes::INVALID_ARGS;
    }
    if e.downcast_ref::<xpost_core::CoreError>()
        .is_some_and(|err| {
            matches!(
                err,
                xpost_core::CoreError::UnknownCredential(_) | xpost_core::CoreError::InvalidConfig(_)
            )
        })
    {
        return ExitCodes::INVALID_ARGS;
    }

    let msg = e.to_string().to_lowercase();
    if msg.contains("argument") || msg.contains("invalid configuration") {
        ExitCodes::INVALID_ARGS
    } else {
        ExitCodes::GENERAL_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use xpost_chat::DisplayMode;

    #[test]
    fn test_categorize_error() {
        assert_eq!(
            categorize_error(&PostNotPublished(DisplayMode::Error).into()),
            ExitCodes::POST_NOT_PUBLISHED
        );
        assert_eq!(categorize_error(&NoActivePost.into()), ExitCodes::INVALID_ARGS);
        assert_eq!(
            categorize_error(&xpost_core::CoreError::UnknownCredential("X".to_string()).into()),
            ExitCodes::INVALID_ARGS
        );
        let bad_config = anyhow::Error::from(xpost_core::CoreError::InvalidConfig(
            "XPOST_TIMEOUT_SECS must be a whole number, got 'soon'".to_string(),
        ))
        .context("Failed to load configuration");
        assert_eq!(categorize_error(&bad_config), ExitCodes::INVALID_ARGS);
        assert_eq!(
            categorize_error(&anyhow!("Topic argument must not be empty")),
            ExitCodes::INVALID_ARGS
        );
        assert_eq!(categorize_error(&anyhow!("disk full")), ExitCodes::GENERAL_ERROR);
    }
}
