//! Newtype wrappers for identifiers carried by stored events.
//!
//! These keep a store-assigned record ID from being confused with a pull
//! request number or a raw commit hash.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Store-assigned identifier of a persisted event.
///
/// Opaque to callers; always rendered as a string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Generates a fresh identifier. Every call yields a distinct value.
    pub fn generate() -> Self {
        EventId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A pull request number within a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

/// Length of the abbreviated commit hash kept in commit summaries.
pub const SHORT_SHA_LEN: usize = 7;

/// Returns the first seven characters of a commit hash.
///
/// Counts characters rather than bytes, so odd input never splits a code point.
pub fn short_sha(full: &str) -> String {
    full.chars().take(SHORT_SHA_LEN).collect()
}
