//! Backend adapter.
//!
//! The backend does all generation and publishing. This side only forwards
//! the topic or feedback together with the user's credentials and hands the
//! raw response back for classification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use xpost_core::{ClientConfig, Credentials};

use crate::error::{ChatError, ChatResult};
use crate::types::BackendResponse;

/// The two calls the post backend offers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostBackend: Send + Sync {
    /// Start a new thread from a topic.
    async fn generate(&self, topic: &str, credentials: &Credentials) -> ChatResult<BackendResponse>;

    /// Continue an existing thread with user feedback.
    async fn resume(
        &self,
        thread_id: &str,
        feedback: &str,
        credentials: &Credentials,
    ) -> ChatResult<BackendResponse>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    input: &'a str,
}

#[derive(Debug, Serialize)]
struct ResumeRequest<'a> {
    feedback: &'a str,
}

/// HTTP implementation of [`PostBackend`]
pub struct HttpBackend {
    base_url: Url,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client for `base_url`.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> ChatResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ChatError::Transport(format!("Invalid backend URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ChatError::Transport(format!("Invalid backend URL '{}'", base_url)));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ChatError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            timeout,
            client,
        })
    }

    /// Create a backend client from the resolved client configuration.
    pub fn from_config(config: &ClientConfig) -> ChatResult<Self> {
        Self::new(&config.backend_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/generate/`
    pub fn generate_url(&self) -> Url {
        self.endpoint(&["generate", ""])
    }

    /// `<base>/resume/<thread_id>`
    pub fn resume_url(&self, thread_id: &str) -> Url {
        self.endpoint(&["resume", thread_id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // base URLs are checked in new(), so segments are always available
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
        credentials: &Credentials,
    ) -> ChatResult<BackendResponse> {
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        for (name, value) in credentials.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(status, path = url.path(), "Backend responded");

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ChatError::MalformedResponse(format!("HTTP {}: {}", status, e)))?;
        if !body.is_object() {
            return Err(ChatError::MalformedResponse(format!(
                "HTTP {}: expected a JSON object",
                status
            )));
        }

        Ok(BackendResponse::new(status, body))
    }

    fn transport_error(&self, error: reqwest::Error) -> ChatError {
        if error.is_timeout() {
            ChatError::Timeout(self.timeout.map(|t| t.as_secs()).unwrap_or_default())
        } else {
            ChatError::Transport(format!("Could not connect to backend: {}", error))
        }
    }
}

#[async_trait]
impl PostBackend for HttpBackend {
    async fn generate(&self, topic: &str, credentials: &Credentials) -> ChatResult<BackendResponse> {
        info!("Requesting a new post from {}", self.base_url);
        self.post_json(self.generate_url(), &GenerateRequest { input: topic }, credentials)
            .await
    }

    async fn resume(
        &self,
        thread_id: &str,
        feedback: &str,
        credentials: &Credentials,
    ) -> ChatResult<BackendResponse> {
        info!("Sending feedback on thread {}", thread_id);
        self.post_json(
            self.resume_url(thread_id),
            &ResumeRequest { feedback },
            credentials,
        )
        .await
    }
}
