//! Conversation controller.
//!
//! Owns the single active conversation and the credentials relayed with
//! every call. `start` and `resume` are the only transitions that talk to the
//! backend; both fold their outcome through [`reduce`].

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use xpost_core::{CredentialName, CredentialStore, Credentials};

use crate::backend::PostBackend;
use crate::classify::reduce;
use crate::error::{ChatError, ChatResult};
use crate::types::{BackendResponse, CallKind, ConversationState, DisplayMode};

/// Cancels whichever backend call is outstanding when [`cancel`] runs.
///
/// A cancel with nothing in flight is dropped; it does not affect the next
/// call.
///
/// [`cancel`]: CancelHandle::cancel
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    notify: Arc<Notify>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.notify.notify_waiters();
    }

    async fn cancelled(&self) {
        self.notify.notified().await;
    }
}

/// Main conversation controller
pub struct ConversationController<B: PostBackend> {
    backend: B,
    store: CredentialStore,
    credentials: Credentials,
    state: ConversationState,
    cancel: CancelHandle,
}

impl<B: PostBackend> ConversationController<B> {
    /// Create a controller, loading credentials from `store`.
    pub fn new(backend: B, store: CredentialStore) -> Self {
        let credentials = store.load();
        Self {
            backend,
            store,
            credentials,
            state: ConversationState::default(),
            cancel: CancelHandle::new(),
        }
    }

    /// Continue from a previously saved conversation.
    pub fn with_state(mut self, mut state: ConversationState) -> Self {
        state.busy = false;
        self.state = state;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.state.display_mode()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Handle for cancelling the outstanding call from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Edit one credential in memory. Call [`save_credentials`] to persist.
    ///
    /// [`save_credentials`]: Self::save_credentials
    pub fn update_credential(&mut self, name: CredentialName, value: impl Into<String>) {
        self.credentials = std::mem::take(&mut self.credentials).update(name, value);
    }

    pub fn save_credentials(&self) -> ChatResult<()> {
        self.store.save(&self.credentials)?;
        info!("Credentials saved");
        Ok(())
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Write the single input field: feedback while a draft awaits feedback,
    /// the topic otherwise.
    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.display_mode() == DisplayMode::NeedsFeedback {
            self.state.feedback = text.into();
        } else {
            self.state.topic = text.into();
        }
    }

    /// Act on the current input. No-op while a call is outstanding.
    pub async fn submit(&mut self) -> Option<DisplayMode> {
        if self.state.busy {
            debug!("Ignoring submit while a call is outstanding");
            return None;
        }

        if self.display_mode() == DisplayMode::NeedsFeedback {
            let feedback = self.state.feedback.clone();
            self.resume(&feedback).await
        } else {
            let topic = self.state.topic.clone();
            self.start(&topic).await
        }
    }

    /// Ask the backend for a new post about `topic`.
    ///
    /// Returns `None` without calling the backend when the topic is blank.
    pub async fn start(&mut self, topic: &str) -> Option<DisplayMode> {
        if topic.trim().is_empty() {
            debug!("Ignoring start with an empty topic");
            return None;
        }

        self.state.topic.clear();
        self.state.status.clear();
        self.state.post.clear();
        self.state.reason.clear();
        self.state.error = None;
        self.state.busy = true;

        info!("Starting a new post");
        let outcome = self
            .dispatch(self.backend.generate(topic, &self.credentials))
            .await;
        Some(self.settle(CallKind::Start, outcome))
    }

    /// Send feedback on the active thread.
    ///
    /// Returns `None` without calling the backend when there is no thread or
    /// the feedback is blank.
    pub async fn resume(&mut self, feedback: &str) -> Option<DisplayMode> {
        let Some(thread_id) = self.state.thread_id.clone() else {
            debug!("Ignoring resume without an active thread");
            return None;
        };
        if feedback.trim().is_empty() {
            debug!("Ignoring resume with empty feedback");
            return None;
        }

        self.state.feedback.clear();
        self.state.error = None;
        self.state.busy = true;

        info!("Resuming thread {}", thread_id);
        let outcome = self
            .dispatch(self.backend.resume(&thread_id, feedback, &self.credentials))
            .await;
        Some(self.settle(CallKind::Resume, outcome))
    }

    /// Forget the active conversation. No backend call.
    pub fn reset(&mut self) {
        self.state.reset();
        debug!("Conversation reset");
    }

    async fn dispatch<F>(&self, call: F) -> ChatResult<BackendResponse>
    where
        F: Future<Output = ChatResult<BackendResponse>>,
    {
        tokio::select! {
            outcome = call => outcome,
            _ = self.cancel.cancelled() => Err(ChatError::Cancelled),
        }
    }

    fn settle(&mut self, call: CallKind, outcome: ChatResult<BackendResponse>) -> DisplayMode {
        if let Err(e) = &outcome {
            warn!("Backend call failed: {}", e);
        }

        let (next, mode) = reduce(&self.state, call, &outcome);
        self.state = next;
        info!(mode = mode.label(), status = %self.state.status, "Conversation updated");
        mode
    }
}
