//! Generate command - Start a new post from a topic.

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use super::{finish, AppContext};
use crate::render;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// What the post should be about
    #[arg(required = true, num_args = 1.., value_name = "TOPIC")]
    words: Vec<String>,
}

impl GenerateArgs {
    pub fn topic(&self) -> String {
        self.words.join(" ")
    }
}

pub async fn execute(args: GenerateArgs, ctx: &AppContext) -> Result<()> {
    let topic = args.topic();
    if topic.trim().is_empty() {
        bail!("Topic argument must not be empty");
    }

    let mut controller = ctx.controller()?;
    if controller.credentials().is_empty() {
        println!("⚠️  No API keys stored. Add them with `xpost keys set <NAME> <VALUE>`.");
    }

    info!("Generating post for topic of {} chars", topic.chars().count());
    println!("⏳ Working...");

    let Some(mode) = controller.start(&topic).await else {
        return Ok(());
    };
    ctx.save(&controller)?;

    render::print_state(controller.state());
    finish(mode)
}
