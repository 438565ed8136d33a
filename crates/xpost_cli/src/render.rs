//! Terminal rendering of the conversation.

use std::fmt::{self, Write};

use xpost_chat::{ConversationState, DisplayMode};

/// Print the panel for the current display mode.
pub fn print_state(state: &ConversationState) {
    print!("{}", render_state(state));
}

/// Render the panel for the current display mode.
pub fn render_state(state: &ConversationState) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_state(&mut out, state);
    out
}

fn write_state(out: &mut String, state: &ConversationState) -> fmt::Result {
    match state.display_mode() {
        DisplayMode::Working => writeln!(out, "⏳ Working...")?,
        DisplayMode::Success => {
            writeln!(out, "✅ Status: {}", state.status_label())?;
            write_draft(out, &state.post)?;
        }
        DisplayMode::NeedsFeedback => {
            writeln!(out, "📝 Status: Needs Feedback")?;
            write_draft(out, &state.post)?;
            if !state.reason.is_empty() {
                writeln!(out, "   Reason: {}", state.reason)?;
            }
            writeln!(
                out,
                "💬 Reply with feedback to modify this post, or OK / GOOD if it is ready to post."
            )?;
        }
        DisplayMode::Skipped => {
            writeln!(out, "⚠️  Error 429 : ({})", state.reason)?;
            write_draft(out, &state.post)?;
        }
        DisplayMode::Error => {
            writeln!(out, "❌ Error Encountered")?;
            writeln!(out, "   {}", state.error_message())?;
        }
        DisplayMode::Idle => {
            if let Some(error) = &state.error {
                writeln!(out, "❌ {}", error)?;
            }
            write_draft(out, &state.post)?;
            if state.is_empty() {
                writeln!(out, "No active post. Start one with `xpost generate <topic>`.")?;
            }
        }
    }
    Ok(())
}

fn write_draft(out: &mut String, post: &str) -> fmt::Result {
    if post.is_empty() {
        return Ok(());
    }
    writeln!(out, "┌────────────────────────────────────────")?;
    for line in post.lines() {
        writeln!(out, "│ {}", line)?;
    }
    writeln!(out, "└────────────────────────────────────────")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(status: &str, post: &str, reason: &str, thread: Option<&str>) -> ConversationState {
        ConversationState {
            status: status.to_string(),
            post: post.to_string(),
            reason: reason.to_string(),
            thread_id: thread.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_success_panel() {
        let out = render_state(&state("post_sent", "Excited to launch!", "", Some("t1")));
        assert!(out.contains("✅ Status: post sent"));
        assert!(out.contains("│ Excited to launch!"));
    }

    #[test]
    fn test_feedback_panel_shows_reason() {
        let out = render_state(&state("awaiting_feedback", "Draft", "Too long?", Some("t1")));
        assert!(out.contains("Needs Feedback"));
        assert!(out.contains("Reason: Too long?"));
        assert!(out.contains("OK / GOOD"));
    }

    #[test]
    fn test_skipped_panel() {
        let out = render_state(&state("SKIPPED", "draft text", "queue full", None));
        assert!(out.contains("Error 429 : (queue full)"));
        assert!(out.contains("│ draft text"));
    }

    #[test]
    fn test_error_panel_prefers_error_message() {
        let mut s = state("ERROR", "", "reason text", None);
        s.error = Some("Rate limited, try later".to_string());
        let out = render_state(&s);
        assert!(out.contains("Error Encountered"));
        assert!(out.contains("Rate limited, try later"));
    }

    #[test]
    fn test_idle_with_held_error_still_prints_it() {
        let mut s = state("ERROR", "Draft", "timeout", Some("t1"));
        s.error = Some("Request timed out after 30s".to_string());
        let out = render_state(&s);
        assert!(out.contains("❌ Request timed out after 30s"));
        assert!(out.contains("│ Draft"));
    }

    #[test]
    fn test_empty_state_hint() {
        let out = render_state(&ConversationState::default());
        assert!(out.contains("No active post"));
    }
}
