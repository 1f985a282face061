//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Classification of deliveries by `X-GitHub-Event` label
//! - Normalization of push and pull request payloads into stored events

pub mod events;
pub mod parser;

pub use events::{Classification, KIND_PING, KIND_PULL_REQUEST, KIND_PUSH};
pub use parser::{branch_from_ref, classify, classify_at, is_merged};
