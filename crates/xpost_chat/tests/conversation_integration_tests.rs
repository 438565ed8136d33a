//! Integration tests for the conversation loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::tempdir;

use xpost_chat::{
    BackendResponse, ChatError, ChatResult, ConversationController, ConversationStore,
    DisplayMode, PostBackend,
};
use xpost_core::{CredentialName, CredentialStore, Credentials};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Generate { topic: String, groq_key: String },
    Resume { thread_id: String, feedback: String },
}

/// Backend answering from a script, recording every call.
#[derive(Clone, Default)]
struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<ChatResult<BackendResponse>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ScriptedBackend {
    fn reply(self, http_status: u16, body: Value) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(BackendResponse::new(http_status, body)));
        self
    }

    fn fail(self, error: ChatError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self) -> ChatResult<BackendResponse> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Transport("script exhausted".to_string())))
    }
}

#[async_trait]
impl PostBackend for ScriptedBackend {
    async fn generate(&self, topic: &str, credentials: &Credentials) -> ChatResult<BackendResponse> {
        self.calls.lock().unwrap().push(Call::Generate {
            topic: topic.to_string(),
            groq_key: credentials.groq_api_key.clone(),
        });
        self.next()
    }

    async fn resume(
        &self,
        thread_id: &str,
        feedback: &str,
        _credentials: &Credentials,
    ) -> ChatResult<BackendResponse> {
        self.calls.lock().unwrap().push(Call::Resume {
            thread_id: thread_id.to_string(),
            feedback: feedback.to_string(),
        });
        self.next()
    }
}

/// Backend that never answers.
struct HangingBackend;

#[async_trait]
impl PostBackend for HangingBackend {
    async fn generate(&self, _topic: &str, _credentials: &Credentials) -> ChatResult<BackendResponse> {
        std::future::pending().await
    }

    async fn resume(
        &self,
        _thread_id: &str,
        _feedback: &str,
        _credentials: &Credentials,
    ) -> ChatResult<BackendResponse> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_full_refinement_loop() {
    let temp = tempdir().unwrap();
    let store = CredentialStore::new(temp.path());
    store
        .save(&Credentials::default().update(CredentialName::GroqApiKey, "gsk"))
        .unwrap();

    let backend = ScriptedBackend::default()
        .reply(200, json!({"status": "awaiting_feedback", "post": "Draft one", "thread_id": "t1", "reason": "Review the tone"}))
        .reply(200, json!({"status": "awaiting_feedback", "post": "Draft two"}))
        .reply(200, json!({"status": "Post Sent", "post_result": "Draft two"}));

    let mut controller = ConversationController::new(backend.clone(), store);

    assert_eq!(controller.start("Launch day").await, Some(DisplayMode::NeedsFeedback));
    assert_eq!(controller.state().reason, "Review the tone");

    assert_eq!(controller.resume("shorter").await, Some(DisplayMode::NeedsFeedback));
    assert_eq!(controller.state().post, "Draft two");

    assert_eq!(controller.resume("OK").await, Some(DisplayMode::Success));
    assert_eq!(controller.state().status_label(), "Post Sent");
    assert_eq!(controller.state().thread_id.as_deref(), Some("t1"));

    assert_eq!(
        backend.calls(),
        vec![
            Call::Generate {
                topic: "Launch day".to_string(),
                groq_key: "gsk".to_string()
            },
            Call::Resume {
                thread_id: "t1".to_string(),
                feedback: "shorter".to_string()
            },
            Call::Resume {
                thread_id: "t1".to_string(),
                feedback: "OK".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_backend_error_is_terminal_until_reset() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::default()
        .reply(200, json!({"detail": {"status": "error", "message": "Invalid Twitter credentials"}}))
        .reply(200, json!({"status": "done", "post_result": "Fresh start", "thread_id": "t2"}));

    let mut controller = ConversationController::new(backend.clone(), CredentialStore::new(temp.path()));

    assert_eq!(controller.start("topic").await, Some(DisplayMode::Error));
    assert_eq!(controller.state().error_message(), "Invalid Twitter credentials");

    // no thread, so feedback goes nowhere
    assert_eq!(controller.resume("try again").await, None);

    controller.reset();
    assert_eq!(controller.display_mode(), DisplayMode::Idle);
    assert_eq!(controller.start("another topic").await, Some(DisplayMode::Success));
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_non_success_resume_uses_detail() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::default()
        .reply(200, json!({"status": "awaiting_feedback", "thread_id": "t1"}))
        .reply(404, json!({"detail": "Thread t1 expired"}));

    let mut controller = ConversationController::new(backend, CredentialStore::new(temp.path()));
    controller.start("topic").await;

    assert_eq!(controller.resume("more emoji").await, Some(DisplayMode::Error));
    assert_eq!(controller.state().reason, "Thread t1 expired");
}

#[tokio::test]
async fn test_transport_failure_after_draft() {
    let temp = tempdir().unwrap();
    let backend = ScriptedBackend::default()
        .reply(200, json!({"status": "awaiting_feedback", "post": "Draft", "thread_id": "t1"}))
        .fail(ChatError::Timeout(30));

    let mut controller = ConversationController::new(backend, CredentialStore::new(temp.path()));
    controller.start("topic").await;
    let mode = controller.resume("shorter").await;

    // the draft stays, so the error panel is suppressed but the error is held
    assert_eq!(mode, Some(DisplayMode::Idle));
    assert!(!controller.state().busy);
    assert_eq!(controller.state().post, "Draft");
    assert_eq!(controller.state().thread_id.as_deref(), Some("t1"));
    assert_eq!(controller.state().error.as_deref(), Some("Request timed out after 30s"));
}

#[tokio::test]
async fn test_cancel_outstanding_call() {
    let temp = tempdir().unwrap();
    let mut controller = ConversationController::new(HangingBackend, CredentialStore::new(temp.path()));
    let handle = controller.cancel_handle();

    let (mode, _) = tokio::join!(controller.start("topic"), async {
        tokio::task::yield_now().await;
        handle.cancel();
    });

    assert_eq!(mode, Some(DisplayMode::Error));
    assert!(!controller.state().busy);
    assert_eq!(controller.state().error.as_deref(), Some("Request cancelled"));
}

#[tokio::test]
async fn test_conversation_survives_restart() {
    let temp = tempdir().unwrap();
    let conversations = ConversationStore::new(temp.path());

    let first = ScriptedBackend::default()
        .reply(200, json!({"status": "awaiting_feedback", "post": "Draft", "thread_id": "t7"}));
    let mut controller = ConversationController::new(first, CredentialStore::new(temp.path()));
    controller.start("topic").await;
    conversations.save(controller.state()).unwrap();

    let second = ScriptedBackend::default()
        .reply(200, json!({"status": "completed", "post": "Final"}));
    let mut restored = ConversationController::new(second.clone(), CredentialStore::new(temp.path()))
        .with_state(conversations.load());

    assert_eq!(restored.display_mode(), DisplayMode::NeedsFeedback);
    assert_eq!(restored.resume("ship it").await, Some(DisplayMode::Success));
    assert_eq!(
        second.calls(),
        vec![Call::Resume {
            thread_id: "t7".to_string(),
            feedback: "ship it".to_string()
        }]
    );
}
