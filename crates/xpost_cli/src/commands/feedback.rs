//! Feedback command - Refine the current draft.

use anyhow::{bail, Result};
use clap::Args;

use xpost_chat::DisplayMode;

use super::{finish, AppContext, NoActivePost};
use crate::render;

#[derive(Args, Debug)]
pub struct FeedbackArgs {
    /// Changes to make, or OK / GOOD to publish the draft as is
    #[arg(required = true, num_args = 1.., value_name = "FEEDBACK")]
    words: Vec<String>,
}

impl FeedbackArgs {
    pub fn feedback(&self) -> String {
        self.words.join(" ")
    }
}

pub async fn execute(args: FeedbackArgs, ctx: &AppContext) -> Result<()> {
    let feedback = args.feedback();
    if feedback.trim().is_empty() {
        bail!("Feedback argument must not be empty");
    }

    let mut controller = ctx.controller()?;
    if controller.state().thread_id.is_none() {
        return Err(NoActivePost.into());
    }
    if controller.display_mode() != DisplayMode::NeedsFeedback {
        println!("ℹ️  The current post is not waiting for feedback.");
        render::print_state(controller.state());
        println!("Run `xpost reset` to start over.");
        return Ok(());
    }

    println!("⏳ Working...");
    let Some(mode) = controller.resume(&feedback).await else {
        return Ok(());
    };
    ctx.save(&controller)?;

    render::print_state(controller.state());
    finish(mode)
}
