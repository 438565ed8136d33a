//! Client configuration.
//!
//! Resolution order, later sources winning:
//! 1. Built-in defaults
//! 2. `<data_dir>/settings.json`
//! 3. Environment (`XPOST_BACKEND_URL`, `XPOST_TIMEOUT_SECS`)
//!
//! The data directory itself comes from `XPOST_HOME`, falling back to
//! `$HOME/.xpost`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::credentials::CredentialStore;
use crate::error::{CoreError, CoreResult};

/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "https://x-post-backend.onrender.com";

/// Name of the optional settings file inside the data directory.
pub const SETTINGS_FILE: &str = "settings.json";

pub const ENV_HOME: &str = "XPOST_HOME";
pub const ENV_BACKEND_URL: &str = "XPOST_BACKEND_URL";
pub const ENV_TIMEOUT_SECS: &str = "XPOST_TIMEOUT_SECS";

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the post backend
    pub backend_url: String,
    /// Request timeout; `None` waits for the transport indefinitely
    pub timeout_secs: Option<u64>,
    /// Directory holding credentials, settings and the saved conversation
    pub data_dir: PathBuf,
}

/// Shape of `settings.json`. Every field is optional.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(rename = "backendUrl", skip_serializing_if = "Option::is_none")]
    backend_url: Option<String>,
    #[serde(rename = "timeoutSecs", skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Defaults rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: None,
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the configuration from settings file and process environment.
    pub fn load() -> CoreResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration using `lookup` for environment variables.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let data_dir = lookup(ENV_HOME)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::from_data_dir(data_dir);
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `<data_dir>/settings.json`, if readable.
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(data_dir);
        let settings_path = config.settings_path();

        let Ok(content) = fs::read_to_string(&settings_path) else {
            return config;
        };

        match serde_json::from_str::<StoredSettings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {}", settings_path.display());
                if let Some(url) = settings.backend_url {
                    config.backend_url = url;
                }
                if settings.timeout_secs.is_some() {
                    config.timeout_secs = settings.timeout_secs;
                }
            }
            Err(e) => warn!("Ignoring malformed settings at {}: {}", settings_path.display(), e),
        }

        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<()> {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS).filter(|v| !v.trim().is_empty()) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                CoreError::InvalidConfig(format!("{} must be a whole number, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
            self.timeout_secs = Some(secs);
        }

        Ok(())
    }

    /// Override the backend URL.
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Override the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> CoreResult<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CoreError::InvalidConfig(format!(
                "backend URL must start with http:// or https://, got '{}'",
                self.backend_url
            )));
        }
        if self.timeout_secs == Some(0) {
            return Err(CoreError::InvalidConfig("timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Credential store living in this configuration's data directory.
    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::new(&self.data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".xpost"))
        .unwrap_or_else(|| PathBuf::from(".xpost"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let temp = tempdir().unwrap();
        let config = ClientConfig::load_with(env(&[(ENV_HOME, temp.path().to_str().unwrap())])).unwrap();

        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.data_dir(), temp.path());
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILE),
            r#"{"backendUrl": "http://localhost:8000", "timeoutSecs": 30}"#,
        )
        .unwrap();

        let config = ClientConfig::from_data_dir(temp.path());
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_overrides_settings_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), r#"{"backendUrl": "http://localhost:8000"}"#).unwrap();

        let config = ClientConfig::load_with(env(&[
            (ENV_HOME, temp.path().to_str().unwrap()),
            (ENV_BACKEND_URL, "https://staging.example.com"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "https://staging.example.com");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn test_malformed_settings_are_ignored() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "backendUrl = nope").unwrap();

        let config = ClientConfig::from_data_dir(temp.path());
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_invalid_timeout_env() {
        let temp = tempdir().unwrap();
        let result = ClientConfig::load_with(env(&[
            (ENV_HOME, temp.path().to_str().unwrap()),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));

        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate() {
        let config = ClientConfig::new("/tmp/x");
        assert!(config.validate().is_ok());
        assert!(config.clone().with_backend_url("ftp://host").validate().is_err());
        assert!(config.with_timeout_secs(0).validate().is_err());
    }

    #[test]
    fn test_credential_store_location() {
        let config = ClientConfig::new("/data");
        assert_eq!(
            config.credential_store().path(),
            Path::new("/data/twitter_mcp_keys.json")
        );
    }
}
