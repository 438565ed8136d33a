//! Keys command - Manage the API credentials sent with every request.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use xpost_core::{CredentialName, CredentialStore, Credentials};

use super::AppContext;

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    action: KeysAction,
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Show which keys are stored (values are masked)
    List,

    /// Store one key
    Set {
        /// Key name, e.g. X-Groq-API-Key or x-groq-api-key
        name: String,
        /// Key value
        value: String,
    },

    /// Remove all stored keys
    Clear,
}

pub async fn execute(args: KeysArgs, ctx: &AppContext) -> Result<()> {
    let store = ctx.config.credential_store();

    match args.action {
        KeysAction::List => {
            print_keys(&store.load());
            println!();
            println!("Keys are stored locally in {}", store.path().display());
        }
        KeysAction::Set { name, value } => {
            let name: CredentialName = name.parse()?;
            set_key(&store, name, &value)?;
            println!("✅ {} saved", name.label());
        }
        KeysAction::Clear => {
            store
                .save(&Credentials::default())
                .context("Failed to clear credentials")?;
            println!("✅ All keys cleared");
        }
    }

    Ok(())
}

/// Load, update one field, save.
pub fn set_key(store: &CredentialStore, name: CredentialName, value: &str) -> Result<()> {
    let credentials = store.load().update(name, value.trim());
    store.save(&credentials).context("Failed to save credentials")?;
    Ok(())
}

pub fn print_keys(credentials: &Credentials) {
    println!("🔑 API keys");
    for name in CredentialName::ALL {
        let shown = if credentials.get(name).is_empty() {
            "(not set)".to_string()
        } else {
            credentials.masked(name)
        };
        println!("   {:<24} {:<22} {}", name.storage_key(), name.label(), shown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_key_keeps_other_fields() {
        let temp = tempdir().unwrap();
        let store = CredentialStore::new(temp.path());
        store
            .save(&Credentials::default().update(CredentialName::TwitterApiKey, "api"))
            .unwrap();

        set_key(&store, CredentialName::GroqApiKey, " abc ").unwrap();

        let loaded = store.load();
        assert_eq!(loaded.groq_api_key, "abc");
        assert_eq!(loaded.twitter_api_key, "api");
    }
}
