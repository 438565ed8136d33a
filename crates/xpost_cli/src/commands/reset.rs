//! Reset command - Discard the current post.

use anyhow::{Context, Result};

use super::AppContext;

pub async fn execute(ctx: &AppContext) -> Result<()> {
    let had_post = !ctx.conversations.load().is_empty();

    ctx.conversations
        .clear()
        .context("Failed to clear saved conversation")?;

    if had_post {
        println!("🔄 Post discarded. Start a new one with `xpost generate <topic>`.");
    } else {
        println!("Nothing to reset.");
    }

    Ok(())
}
