//! Status command - Show the current post.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;

use super::AppContext;
use crate::render;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the saved conversation as JSON
    #[arg(long)]
    json: bool,
}

pub async fn execute(args: StatusArgs, ctx: &AppContext) -> Result<()> {
    let state = ctx.conversations.load();

    if args.json {
        let mut value = serde_json::to_value(&state)?;
        value["mode"] = serde_json::to_value(state.display_mode())?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    render::print_state(&state);
    if let Some(saved_at) = ctx.conversations.saved_at() {
        println!();
        println!("Last updated {}", describe_age(saved_at, Utc::now()));
    }

    Ok(())
}

fn describe_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(then);
    let when = then.format("%Y-%m-%d %H:%M UTC");

    if age.num_seconds() < 60 {
        format!("just now ({})", when)
    } else if age.num_minutes() < 60 {
        format!("{} min ago ({})", age.num_minutes(), when)
    } else if age.num_hours() < 24 {
        format!("{} h ago ({})", age.num_hours(), when)
    } else {
        format!("{} days ago ({})", age.num_days(), when)
    }
}
