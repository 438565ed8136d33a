//! Error types for the chat system.

use thiserror::Error;

use xpost_core::CoreError;

/// Chat system errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// The backend could not be reached or the call failed in flight
    #[error("{0}")]
    Transport(String),

    /// The backend answered with something other than a JSON object
    #[error("Malformed response from backend: {0}")]
    MalformedResponse(String),

    /// The call exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The call was cancelled by the user
    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
