//! Chat command - Interactive generate / refine loop.
//!
//! One input line drives the whole flow: it starts a post, or refines the
//! draft when one is waiting for feedback. Ctrl-C while a request is in
//! flight cancels it; at the prompt it leaves the loop.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use xpost_chat::DisplayMode;
use xpost_core::CredentialName;

use super::keys::print_keys;
use super::AppContext;
use crate::render;

const HELP: &str = "Commands: /new (start over), /keys (show keys), /set <NAME> <VALUE> (store a key), /quit";

pub async fn execute(ctx: &AppContext) -> Result<()> {
    let mut controller = ctx.controller()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("X Post Generator - {}", ctx.config.backend_url);
    println!("{}", HELP);
    if !controller.state().is_empty() {
        println!();
        render::print_state(controller.state());
    }

    loop {
        print!("{}", prompt(controller.display_mode()));
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => {
                println!("{}", HELP);
                continue;
            }
            "/new" => {
                controller.reset();
                ctx.save(&controller)?;
                println!("🔄 Started over.");
                continue;
            }
            "/keys" => {
                print_keys(controller.credentials());
                continue;
            }
            _ if line.starts_with("/set ") => {
                match parse_set(line) {
                    Ok((name, value)) => {
                        controller.update_credential(name, value);
                        controller.save_credentials()?;
                        println!("✅ {} saved", name.label());
                    }
                    Err(e) => println!("❌ {}", e),
                }
                continue;
            }
            _ if line.starts_with('/') => {
                println!("Unknown command. {}", HELP);
                continue;
            }
            _ => {}
        }

        controller.set_input(line);
        println!("⏳ Working...");

        let cancel = controller.cancel_handle();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
        let mode = controller.submit().await;
        watcher.abort();

        if let Some(mode) = mode {
            debug!(mode = mode.label(), "Turn finished");
            ctx.save(&controller)?;
            render::print_state(controller.state());
            if mode.is_terminal() {
                println!("Type a new topic, or /new to clear this one.");
            }
        }
    }

    ctx.save(&controller)
}

fn prompt(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::NeedsFeedback => "feedback (or OK / GOOD to post)> ",
        _ => "topic> ",
    }
}

/// Parse `/set <NAME> <VALUE>`.
fn parse_set(line: &str) -> Result<(CredentialName, String)> {
    let rest = line.trim_start_matches("/set").trim();
    let (name, value) = rest
        .split_once(char::is_whitespace)
        .context("Usage: /set <NAME> <VALUE>")?;
    let name: CredentialName = name.parse()?;
    Ok((name, value.trim().to_string()))
}
