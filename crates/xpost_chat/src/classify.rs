//! Response classification.
//!
//! Every backend response, from either call, goes through [`classify`] and
//! then [`reduce`]. The backend may wrap its payload in a `detail` envelope;
//! when it does, the envelope is read first and the top-level object second.

use serde_json::Value;
use tracing::debug;

use crate::error::{ChatError, ChatResult};
use crate::types::{
    BackendResponse, CallKind, ConversationState, DisplayMode, ThreadId, STATUS_ERROR,
    STATUS_SKIPPED,
};

/// Fallback when the backend gives no message or reason.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Fallback for non-2xx responses without a `detail`.
pub const SERVER_ERROR_MESSAGE: &str = "Server error occurred.";

/// Fallback for transport failures without a message.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error";

/// Status assumed when an accepted start response carries none.
pub const DEFAULT_START_STATUS: &str = "done";

/// Outcome of a single backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The call failed; the draft is left untouched
    Error { message: String },
    /// Publishing was deferred; the draft comes back with the response
    Skipped { message: String, post: String },
    /// The backend accepted the call
    Accepted {
        status: Option<String>,
        post: String,
        reason: String,
        thread_id: Option<ThreadId>,
    },
}

impl Classification {
    /// Classification of a call that never produced a response.
    pub fn transport_failure(error: &ChatError) -> Self {
        let message = error.to_string();
        let message = if message.trim().is_empty() {
            NETWORK_ERROR_MESSAGE.to_string()
        } else {
            message
        };
        Self::Error { message }
    }
}

/// Non-empty string field.
fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Thread ids are opaque; accept them as strings or numbers.
fn opaque_id(value: &Value, key: &str) -> Option<ThreadId> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reduce a raw response to exactly one classification.
pub fn classify(response: &BackendResponse, call: CallKind) -> Classification {
    let body = &response.body;
    let detail = body.get("detail");
    let data = match detail {
        Some(envelope) if envelope.is_object() => envelope,
        _ => body,
    };

    // FastAPI errors carry a plain string in `detail`
    let supplied = detail
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| text(data, "message"))
        .or_else(|| text(data, "reason"));
    let message = supplied.unwrap_or(UNEXPECTED_ERROR_MESSAGE).to_string();

    let rate_limited = response.http_status == 429
        || body.get("status").and_then(Value::as_u64) == Some(429);

    if text(data, "status") == Some("error")
        || text(data, "error_type") == Some("RATE_LIMIT")
        || rate_limited
    {
        return Classification::Error { message };
    }

    if !response.is_success() {
        return Classification::Error {
            message: supplied.unwrap_or(SERVER_ERROR_MESSAGE).to_string(),
        };
    }

    if text(data, "status") == Some(STATUS_SKIPPED) {
        return Classification::Skipped {
            message,
            post: text(data, "post").unwrap_or_default().to_string(),
        };
    }

    let status = text(body, "status")
        .or_else(|| text(data, "status"))
        .map(str::to_string)
        .or_else(|| match call {
            CallKind::Start => Some(DEFAULT_START_STATUS.to_string()),
            CallKind::Resume => None,
        });

    let post = text(body, "post_result")
        .or_else(|| text(body, "post"))
        .or_else(|| text(data, "post"))
        .unwrap_or_default()
        .to_string();

    let reason = text(body, "reason")
        .or_else(|| text(data, "message"))
        .unwrap_or_default()
        .to_string();

    Classification::Accepted {
        status,
        post,
        reason,
        thread_id: opaque_id(body, "thread_id"),
    }
}

/// Fold the outcome of a call into the previous state.
///
/// Returns the new state with `busy` cleared, and the display mode it
/// derives to.
pub fn reduce(
    previous: &ConversationState,
    call: CallKind,
    outcome: &ChatResult<BackendResponse>,
) -> (ConversationState, DisplayMode) {
    let classification = match outcome {
        Ok(response) => classify(response, call),
        Err(e) => Classification::transport_failure(e),
    };
    debug!(?call, ?classification, "Classified backend outcome");

    let mut next = previous.clone();
    next.busy = false;

    match classification {
        Classification::Error { message } => {
            next.status = STATUS_ERROR.to_string();
            next.reason = message.clone();
            next.error = Some(message);
        }
        Classification::Skipped { message, post } => {
            next.status = STATUS_SKIPPED.to_string();
            next.reason = message;
            next.post = post;
        }
        Classification::Accepted {
            status,
            post,
            reason,
            thread_id,
        } => {
            next.status = status.unwrap_or_default();
            next.post = post;
            next.reason = reason;
            match call {
                // a new topic replaces whatever thread came before
                CallKind::Start => next.thread_id = thread_id,
                CallKind::Resume => {
                    if thread_id.is_some() {
                        next.thread_id = thread_id;
                    }
                }
            }
        }
    }

    let mode = next.display_mode();
    (next, mode)
}
