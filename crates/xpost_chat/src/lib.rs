//! # xpost_chat - Conversation system for the X Post Generator
//!
//! This crate drives the generate → review → refine → publish loop:
//! - A topic starts a backend thread and comes back as a draft
//! - Feedback resumes the thread until the post is sent, skipped or fails
//! - Credentials are relayed with every call, never interpreted
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Controller    │────▶│   PostBackend   │────▶│  HTTP backend   │
//! └────────┬────────┘     └─────────────────┘     └─────────────────┘
//!          │ raw response
//!          ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │    classify     │────▶│ Conversation    │──▶ DisplayMode
//! │    + reduce     │     │ State           │
//! └─────────────────┘     └─────────────────┘
//! ```

pub mod backend;
pub mod classify;
pub mod controller;
pub mod error;
pub mod persistence;
pub mod types;

pub use backend::*;
pub use classify::*;
pub use controller::*;
pub use error::*;
pub use persistence::*;
pub use types::*;
