//! GitHub webhook payload classifier.
//!
//! Turns an `X-GitHub-Event` label and its JSON payload into a
//! [`Classification`]: either a normalized [`Event`] to store, or a terminal
//! acknowledgement (ping, ignored kind).
//!
//! # Parsing Strategy
//!
//! 1. The event kind is matched exactly (case-sensitive) against the known labels
//! 2. Each field is read along a fixed path through the payload
//! 3. A missing path, or a value of the wrong JSON type anywhere along it,
//!    yields that field's default
//!
//! Classification never fails. Payloads that are not JSON objects are rejected
//! before they reach this module.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::events::{Classification, KIND_PING, KIND_PULL_REQUEST, KIND_PUSH};
use crate::types::{CommitSummary, Event, EventType, PrNumber, format_timestamp, short_sha};

/// Placeholder for an actor, repository, action or branch the payload omits.
pub const UNKNOWN: &str = "unknown";

/// Prefix GitHub puts in front of branch names in push `ref`s.
const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Classifies a delivery, stamping recorded events with the current time.
pub fn classify(event_kind: &str, payload: &Value) -> Classification {
    classify_at(event_kind, payload, Utc::now())
}

/// Classifies a delivery, stamping recorded events with `now`.
pub fn classify_at(event_kind: &str, payload: &Value, now: DateTime<Utc>) -> Classification {
    match event_kind {
        KIND_PING => parse_ping(payload),
        KIND_PUSH => Classification::Record(parse_push(payload, format_timestamp(now))),
        KIND_PULL_REQUEST => {
            Classification::Record(parse_pull_request(payload, format_timestamp(now)))
        }
        other => Classification::Ignored {
            event_kind: other.to_string(),
        },
    }
}

/// Follows `path` through nested objects and returns the string found there.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |node, key| node.get(*key))
        .and_then(Value::as_str)
}

fn string_or(value: &Value, path: &[&str], default: &str) -> String {
    str_at(value, path).unwrap_or(default).to_string()
}

/// Derives a branch name from a push `ref`.
///
/// `refs/heads/main` becomes `main`; other refs (tags, already-bare names)
/// pass through unchanged. A missing or empty ref yields `"unknown"`.
pub fn branch_from_ref(git_ref: Option<&str>) -> String {
    match git_ref {
        None | Some("") => UNKNOWN.to_string(),
        Some(r) => r.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(r).to_string(),
    }
}

// ============================================================================
// ping
// ============================================================================

fn parse_ping(payload: &Value) -> Classification {
    Classification::Ping {
        zen: string_or(payload, &["zen"], ""),
        hook_id: payload.get("hook_id").cloned().unwrap_or(Value::Null),
    }
}

// ============================================================================
// push
// ============================================================================

fn parse_commit(entry: &Value) -> CommitSummary {
    CommitSummary {
        id: short_sha(str_at(entry, &["id"]).unwrap_or("")),
        message: string_or(entry, &["message"], ""),
        author: string_or(entry, &["author", "name"], ""),
        timestamp: string_or(entry, &["timestamp"], ""),
    }
}

fn parse_push(payload: &Value, timestamp: String) -> Event {
    let commits = payload
        .get("commits")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().map(parse_commit).collect())
        .unwrap_or_default();

    Event {
        author: string_or(payload, &["pusher", "name"], UNKNOWN),
        action: None,
        to_branch: Some(branch_from_ref(str_at(payload, &["ref"]))),
        from_branch: None,
        event_type: EventType::Push,
        timestamp,
        repository: string_or(payload, &["repository", "full_name"], UNKNOWN),
        request_id: None,
        commits: Some(commits),
        message: Some(string_or(payload, &["head_commit", "message"], "")),
    }
}

// ============================================================================
// pull_request
// ============================================================================

/// Returns true only when `pull_request.merged` is the JSON value `true`.
pub fn is_merged(payload: &Value) -> bool {
    payload
        .get("pull_request")
        .and_then(|pr| pr.get("merged"))
        .and_then(Value::as_bool)
        == Some(true)
}

fn parse_pull_request(payload: &Value, timestamp: String) -> Event {
    let event_type = if is_merged(payload) {
        EventType::Merge
    } else {
        EventType::PullRequest
    };

    let request_id = payload
        .get("pull_request")
        .and_then(|pr| pr.get("number"))
        .and_then(Value::as_u64)
        .map(PrNumber);

    Event {
        author: string_or(payload, &["pull_request", "user", "login"], UNKNOWN),
        action: Some(string_or(payload, &["action"], UNKNOWN)),
        to_branch: Some(string_or(payload, &["pull_request", "base", "ref"], "")),
        from_branch: Some(string_or(payload, &["pull_request", "head", "ref"], "")),
        event_type,
        timestamp,
        repository: string_or(payload, &["repository", "full_name"], UNKNOWN),
        request_id,
        commits: None,
        message: Some(string_or(payload, &["pull_request", "title"], "")),
    }
}
