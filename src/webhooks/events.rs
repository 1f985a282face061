//! Outcomes of classifying a webhook delivery.
//!
//! The event kinds handled here:
//!
//! - `push` - commits pushed to a branch
//! - `pull_request` - PR lifecycle (opened, closed, merged, ...)
//! - `ping` - sent once when a webhook is configured
//!
//! Anything else is acknowledged and ignored.

use serde_json::Value;

use crate::types::Event;

/// `X-GitHub-Event` value for pushes.
pub const KIND_PUSH: &str = "push";
/// `X-GitHub-Event` value for pull request activity.
pub const KIND_PULL_REQUEST: &str = "pull_request";
/// `X-GitHub-Event` value for the configuration ping.
pub const KIND_PING: &str = "ping";

/// What to do with a delivery after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A normalized event that should be persisted.
    Record(Event),

    /// The webhook was just configured. Acknowledge without storing.
    Ping {
        /// GitHub's random design aphorism.
        zen: String,
        /// Hook ID exactly as sent, or `null`.
        hook_id: Value,
    },

    /// An event kind this service does not record.
    Ignored {
        /// The `X-GitHub-Event` value that was received.
        event_kind: String,
    },
}
