//! Conversation persistence.
//!
//! Each CLI invocation is a fresh process, so the active conversation is
//! kept on disk between calls:
//! `<data_dir>/conversation.json`
//!
//! Only one conversation exists at a time. The busy flag is never written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ChatResult;
use crate::types::ConversationState;

/// File name of the saved conversation.
pub const CONVERSATION_FILE: &str = "conversation.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredConversation {
    #[serde(rename = "savedAt")]
    saved_at: DateTime<Utc>,
    conversation: ConversationState,
}

/// Persistence manager for the active conversation
#[derive(Debug, Clone)]
pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    /// Create a store keeping its file inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(CONVERSATION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved conversation. Missing or malformed files yield the
    /// empty state.
    pub fn load(&self) -> ConversationState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return ConversationState::default(),
            Err(e) => {
                warn!("Could not read conversation at {}: {}", self.path.display(), e);
                return ConversationState::default();
            }
        };

        match serde_json::from_str::<StoredConversation>(&content) {
            Ok(stored) => {
                debug!("Restored conversation saved at {}", stored.saved_at);
                stored.conversation
            }
            Err(e) => {
                warn!("Ignoring malformed conversation at {}: {}", self.path.display(), e);
                ConversationState::default()
            }
        }
    }

    /// When the conversation was last saved, if ever.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str::<StoredConversation>(&content)
            .ok()
            .map(|stored| stored.saved_at)
    }

    /// Save the conversation, replacing the previous one.
    pub fn save(&self, state: &ConversationState) -> ChatResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let stored = StoredConversation {
            saved_at: Utc::now(),
            conversation: state.clone(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;

        Ok(())
    }

    /// Remove the saved conversation.
    pub fn clear(&self) -> ChatResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
