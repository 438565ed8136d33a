//! Core types for the conversation system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a backend thread. Opaque to the client.
pub type ThreadId = String;

/// Status label written on a backend-reported or transport error.
pub const STATUS_ERROR: &str = "ERROR";

/// Status label written when the backend skipped publishing.
pub const STATUS_SKIPPED: &str = "SKIPPED";

/// Normalized statuses that mean the post went out.
const SUCCESS_STATUSES: [&str; 4] = ["done", "completed", "success", "post_sent"];

/// Which backend call produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `POST /generate/`
    Start,
    /// `POST /resume/{thread_id}`
    Resume,
}

/// A raw backend response: HTTP status plus the parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub http_status: u16,
    pub body: Value,
}

impl BackendResponse {
    pub fn new(http_status: u16, body: Value) -> Self {
        Self { http_status, body }
    }

    /// A 200 response carrying `body`.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

/// What the client should currently show
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Nothing in flight and nothing to show
    Idle,
    /// A backend call is outstanding
    Working,
    /// A draft is waiting for the user's feedback
    NeedsFeedback,
    /// The post was published
    Success,
    /// Publishing was deferred; the draft is kept
    Skipped,
    /// The call failed
    Error,
}

impl DisplayMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Working => "Working",
            Self::NeedsFeedback => "Needs Feedback",
            Self::Success => "Success",
            Self::Skipped => "Skipped",
            Self::Error => "Error",
        }
    }

    /// Modes that end a thread; the only way on is a reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Skipped | Self::Error)
    }
}

/// State of the single active conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversationState {
    /// Topic input
    pub topic: String,
    /// Feedback input
    pub feedback: String,
    /// Backend thread, present once a start has been accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<ThreadId>,
    /// Status label as reported by the backend (or ERROR/SKIPPED)
    pub status: String,
    /// Current draft
    pub post: String,
    /// Explanation accompanying the status
    pub reason: String,
    /// Error message of the last failed call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True only while a backend call is outstanding
    #[serde(skip)]
    pub busy: bool,
}

impl ConversationState {
    /// Derive the display mode. Pure; recomputed on every render.
    pub fn display_mode(&self) -> DisplayMode {
        if self.busy {
            return DisplayMode::Working;
        }

        let normalized = normalize_status(&self.status);

        if SUCCESS_STATUSES.contains(&normalized.as_str()) {
            DisplayMode::Success
        } else if self.status == STATUS_SKIPPED {
            DisplayMode::Skipped
        } else if self.status == STATUS_ERROR && self.post.is_empty() {
            DisplayMode::Error
        } else if self.awaits_feedback(&normalized) {
            DisplayMode::NeedsFeedback
        } else {
            DisplayMode::Idle
        }
    }

    // The reason checks guard against backends that report a failure under
    // an ordinary status label.
    fn awaits_feedback(&self, normalized: &str) -> bool {
        self.thread_id.is_some()
            && normalized != "skipped"
            && normalized != "error"
            && !self.reason.contains("429")
            && !self.reason.to_lowercase().contains("error")
    }

    /// Message to show for a failed call.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or(&self.reason)
    }

    /// Status label for display, underscores turned into spaces.
    pub fn status_label(&self) -> String {
        self.status.replace('_', " ")
    }

    /// True when nothing has happened since the last reset.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Clear everything. Idempotent.
    pub fn reset(&mut self) {
        let busy = self.busy;
        *self = Self::default();
        self.busy = busy;
    }
}

/// Lower-case a status and replace spaces with underscores.
pub fn normalize_status(status: &str) -> String {
    status.to_lowercase().replace(' ', "_")
}
