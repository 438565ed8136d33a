//! # xpost_core
//!
//! Shared building blocks for the X Post Generator client:
//! - [`CredentialStore`]: the six API credentials, kept in a local JSON record
//! - [`ClientConfig`]: backend URL, timeout and data directory resolution
//!
//! Nothing here talks to the network. Credentials are stored and handed to
//! the chat layer, which relays them to the backend.

pub mod config;
pub mod credentials;
pub mod error;

pub use config::*;
pub use credentials::*;
pub use error::*;
