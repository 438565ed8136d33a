//! Per-user API credentials and the local store that keeps them.
//!
//! The record is stored as one flat JSON object under a fixed key:
//! `<data_dir>/twitter_mcp_keys.json`
//!
//! The client never validates these values. They are relayed verbatim to the
//! backend as request headers, and the backend decides whether they work.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};

/// Fixed storage key of the credential record.
pub const CREDENTIALS_KEY: &str = "twitter_mcp_keys";

/// The six credentials the backend needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialName {
    TwitterBearer,
    TwitterApiKey,
    TwitterApiSecret,
    TwitterAccessToken,
    TwitterAccessSecret,
    GroqApiKey,
}

impl CredentialName {
    /// All credential names, in settings-panel order.
    pub const ALL: [CredentialName; 6] = [
        Self::TwitterBearer,
        Self::TwitterApiKey,
        Self::TwitterApiSecret,
        Self::TwitterAccessToken,
        Self::TwitterAccessSecret,
        Self::GroqApiKey,
    ];

    /// Key used in the persisted record.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::TwitterBearer => "X-Twitter-Bearer",
            Self::TwitterApiKey => "X-Twitter-API-Key",
            Self::TwitterApiSecret => "X-Twitter-API-Secret",
            Self::TwitterAccessToken => "X-Twitter-Access-Token",
            Self::TwitterAccessSecret => "X-Twitter-Access-Secret",
            Self::GroqApiKey => "X-Groq-API-Key",
        }
    }

    /// HTTP header carrying this credential to the backend.
    pub fn header_name(&self) -> &'static str {
        match self {
            Self::TwitterBearer => "x-twitter-bearer",
            Self::TwitterApiKey => "x-twitter-api-key",
            Self::TwitterApiSecret => "x-twitter-api-secret",
            Self::TwitterAccessToken => "x-twitter-access-token",
            Self::TwitterAccessSecret => "x-twitter-access-secret",
            Self::GroqApiKey => "x-groq-api-key",
        }
    }

    /// Human-readable label for settings output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TwitterBearer => "Twitter Bearer",
            Self::TwitterApiKey => "Twitter API Key",
            Self::TwitterApiSecret => "Twitter API Secret",
            Self::TwitterAccessToken => "Twitter Access Token",
            Self::TwitterAccessSecret => "Twitter Access Secret",
            Self::GroqApiKey => "Groq API Key",
        }
    }
}

impl fmt::Display for CredentialName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

impl FromStr for CredentialName {
    type Err = CoreError;

    /// Accepts either the storage key or the header name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|name| {
                name.storage_key().eq_ignore_ascii_case(wanted)
                    || name.header_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| CoreError::UnknownCredential(s.to_string()))
    }
}

/// The credential record. Every field defaults to the empty string.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(rename = "X-Twitter-Bearer", deserialize_with = "string_or_empty")]
    pub twitter_bearer: String,
    #[serde(rename = "X-Twitter-API-Key", deserialize_with = "string_or_empty")]
    pub twitter_api_key: String,
    #[serde(rename = "X-Twitter-API-Secret", deserialize_with = "string_or_empty")]
    pub twitter_api_secret: String,
    #[serde(rename = "X-Twitter-Access-Token", deserialize_with = "string_or_empty")]
    pub twitter_access_token: String,
    #[serde(rename = "X-Twitter-Access-Secret", deserialize_with = "string_or_empty")]
    pub twitter_access_secret: String,
    #[serde(rename = "X-Groq-API-Key", deserialize_with = "string_or_empty")]
    pub groq_api_key: String,
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Credentials {
    /// Get the value stored under `name`.
    pub fn get(&self, name: CredentialName) -> &str {
        match name {
            CredentialName::TwitterBearer => &self.twitter_bearer,
            CredentialName::TwitterApiKey => &self.twitter_api_key,
            CredentialName::TwitterApiSecret => &self.twitter_api_secret,
            CredentialName::TwitterAccessToken => &self.twitter_access_token,
            CredentialName::TwitterAccessSecret => &self.twitter_access_secret,
            CredentialName::GroqApiKey => &self.groq_api_key,
        }
    }

    /// Replace the value stored under `name` in place.
    pub fn set(&mut self, name: CredentialName, value: impl Into<String>) {
        let slot = match name {
            CredentialName::TwitterBearer => &mut self.twitter_bearer,
            CredentialName::TwitterApiKey => &mut self.twitter_api_key,
            CredentialName::TwitterApiSecret => &mut self.twitter_api_secret,
            CredentialName::TwitterAccessToken => &mut self.twitter_access_token,
            CredentialName::TwitterAccessSecret => &mut self.twitter_access_secret,
            CredentialName::GroqApiKey => &mut self.groq_api_key,
        };
        *slot = value.into();
    }

    /// Return a copy with one field replaced. Nothing is persisted.
    pub fn update(mut self, name: CredentialName, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// True when no credential has been entered.
    pub fn is_empty(&self) -> bool {
        CredentialName::ALL.iter().all(|name| self.get(*name).is_empty())
    }

    /// Header name/value pairs to attach to a backend request.
    pub fn headers(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        CredentialName::ALL
            .iter()
            .map(move |name| (name.header_name(), self.get(*name)))
    }

    /// Masked rendering of one value, safe to print.
    pub fn masked(&self, name: CredentialName) -> String {
        mask_secret(self.get(name))
    }
}

// Secrets never reach log output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in CredentialName::ALL {
            let shown = if self.get(name).is_empty() { "" } else { "<redacted>" };
            map.entry(&name.storage_key(), &shown);
        }
        map.finish()
    }
}

/// Mask a secret, keeping two characters at each end of longer values.
/// Short values collapse to a fixed `****` so their length is not shown.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        String::new()
    } else if chars.len() <= 4 {
        "****".to_string()
    } else {
        let head: String = chars[..2].iter().collect();
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Durable store for the credential record.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Create a store keeping its record inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir
                .as_ref()
                .join(format!("{}.json", CREDENTIALS_KEY)),
        }
    }

    /// Location of the persisted record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// Never fails: a missing, unreadable or malformed record yields empty
    /// credentials.
    pub fn load(&self) -> Credentials {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored credentials at {}", self.path.display());
                return Credentials::default();
            }
            Err(e) => {
                warn!("Could not read credentials at {}: {}", self.path.display(), e);
                return Credentials::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Ignoring malformed credentials at {}: {}", self.path.display(), e);
                Credentials::default()
            }
        }
    }

    /// Persist the full record, replacing whatever was stored.
    pub fn save(&self, credentials: &Credentials) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(credentials)?;
        fs::write(&self.path, content)?;
        debug!("Saved credentials to {}", self.path.display());

        Ok(())
    }
}
