//! The canonical event record and its validation rules.
//!
//! An [`Event`] is what the classifier produces from a raw webhook payload and
//! what the store persists. A [`StoredEvent`] is the same record together with
//! its store-assigned [`EventId`].
//!
//! # Wire and storage layout
//!
//! A stored event is one flat JSON object. Absent optional fields are written
//! as `null` so every document carries the same keys:
//!
//! ```json
//! {"_id":"3f2a...","author":"alice","action":null,"to_branch":"main","from_branch":null,
//!  "event_type":"push","timestamp":"2024-01-15T10:00:00.000000Z","repository":"org/repo",
//!  "request_id":null,"commits":[],"message":"fix bug"}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ids::{EventId, PrNumber};

/// Errors raised when a document does not satisfy the event schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The document is not a JSON object.
    #[error("event document must be a JSON object")]
    NotAnObject,

    /// A required field is absent or null.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// `event_type` is not one of the recognized values.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// A field is present but has the wrong shape.
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Classification of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Commits pushed to a branch.
    Push,
    /// Pull request activity that did not merge it.
    PullRequest,
    /// Pull request activity whose payload reports it merged.
    Merge,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Push => "push",
            EventType::PullRequest => "pull_request",
            EventType::Merge => "merge",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(EventType::Push),
            "pull_request" => Ok(EventType::PullRequest),
            "merge" => Ok(EventType::Merge),
            other => Err(ValidationError::UnknownEventType(other.to_string())),
        }
    }
}

/// Summary of one commit in a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// First seven characters of the commit hash.
    pub id: String,
    pub message: String,
    /// Commit author's display name.
    pub author: String,
    /// Commit timestamp as reported by GitHub (not parsed).
    pub timestamp: String,
}

/// A normalized webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Actor who triggered the event.
    pub author: String,

    /// Pull request sub-action (opened, closed, ...). Pull request events only.
    pub action: Option<String>,

    /// Target branch.
    pub to_branch: Option<String>,

    /// Source branch. Pull request events only.
    pub from_branch: Option<String>,

    pub event_type: EventType,

    /// RFC 3339 UTC time at which the event was processed.
    pub timestamp: String,

    /// Full repository name (`owner/name`).
    pub repository: String,

    /// Pull request number. Pull request events only.
    pub request_id: Option<PrNumber>,

    /// Pushed commits, in payload order. Push events only.
    pub commits: Option<Vec<CommitSummary>>,

    /// Head commit message for pushes, title for pull requests.
    pub message: Option<String>,
}

impl Event {
    /// Checks the constraints that the type system does not already enforce.
    ///
    /// Required string fields may be empty. The timestamp must be RFC 3339;
    /// any offset is accepted and normalized by [`Event::occurred_at`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map_err(|e| {
            ValidationError::InvalidField {
                field: "timestamp",
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }

    /// The event's timestamp as a UTC instant, or `None` if it does not parse.
    ///
    /// Stores order on this rather than on the raw string, since RFC 3339
    /// allows offsets and variable fractional digits.
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Builds an event from an untyped JSON document, reporting which schema
    /// rule the document breaks.
    pub fn from_document(document: Value) -> Result<Self, ValidationError> {
        let Value::Object(map) = document else {
            return Err(ValidationError::NotAnObject);
        };

        require_string(&map, "author")?;
        require_string(&map, "timestamp")?;
        require_string(&map, "repository")?;
        let event_type = require_string(&map, "event_type")?;
        event_type.parse::<EventType>()?;

        let event: Event =
            serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::InvalidField {
                field: "document",
                reason: e.to_string(),
            })?;
        event.validate()?;
        Ok(event)
    }
}

fn require_string<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// An event as held by a store, tagged with its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    #[serde(rename = "_id")]
    pub id: EventId,

    #[serde(flatten)]
    pub event: Event,
}

impl StoredEvent {
    /// Reads a stored record back from its JSON document.
    pub fn from_document(document: Value) -> Result<Self, ValidationError> {
        let Value::Object(mut map) = document else {
            return Err(ValidationError::NotAnObject);
        };
        let id = match map.remove("_id") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("_id")),
            Some(Value::String(s)) => EventId(s),
            Some(other) => {
                return Err(ValidationError::InvalidField {
                    field: "_id",
                    reason: format!("expected a string, got {}", other),
                });
            }
        };
        let event = Event::from_document(Value::Object(map))?;
        Ok(StoredEvent { id, event })
    }
}

/// Formats a processing time the way every stored event records it.
///
/// Fixed-width microsecond precision keeps lexical and chronological order
/// in agreement.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn push_document() -> Value {
        json!({
            "author": "alice",
            "action": null,
            "to_branch": "main",
            "from_branch": null,
            "event_type": "push",
            "timestamp": "2024-01-15T10:00:00.000000Z",
            "repository": "org/repo",
            "request_id": null,
            "commits": [
                {"id": "abcdef1", "message": "fix bug", "author": "Alice", "timestamp": ""}
            ],
            "message": "fix bug"
        })
    }

    #[test]
    fn event_type_wire_names() {
        assert_eq!(serde_json::to_value(EventType::Push).unwrap(), json!("push"));
        assert_eq!(
            serde_json::to_value(EventType::PullRequest).unwrap(),
            json!("pull_request")
        );
        assert_eq!(serde_json::to_value(EventType::Merge).unwrap(), json!("merge"));
    }

    #[test]
    fn event_type_parse_is_case_sensitive() {
        assert_eq!("merge".parse::<EventType>(), Ok(EventType::Merge));
        assert_eq!(
            "PUSH".parse::<EventType>(),
            Err(ValidationError::UnknownEventType("PUSH".to_string()))
        );
    }

    #[test]
    fn from_document_accepts_valid_push() {
        let event = Event::from_document(push_document()).unwrap();
        assert_eq!(event.author, "alice");
        assert_eq!(event.event_type, EventType::Push);
        assert_eq!(event.commits.as_ref().map(Vec::len), Some(1));
        assert_eq!(event.from_branch, None);
    }

    #[test]
    fn from_document_accepts_missing_optionals() {
        let event = Event::from_document(json!({
            "author": "bob",
            "event_type": "merge",
            "timestamp": "2024-01-15T10:00:00Z",
            "repository": "org/repo"
        }))
        .unwrap();
        assert_eq!(event.event_type, EventType::Merge);
        assert!(event.commits.is_none());
        assert!(event.request_id.is_none());
    }

    #[test]
    fn from_document_rejects_each_missing_required_field() {
        for field in ["author", "event_type", "timestamp", "repository"] {
            let mut doc = push_document();
            doc.as_object_mut().unwrap().remove(field);
            assert_eq!(
                Event::from_document(doc),
                Err(ValidationError::MissingField(field)),
                "field {}",
                field
            );
        }
    }

    #[test]
    fn from_document_rejects_null_required_field() {
        let mut doc = push_document();
        doc["author"] = Value::Null;
        assert_eq!(
            Event::from_document(doc),
            Err(ValidationError::MissingField("author"))
        );
    }

    #[test]
    fn from_document_rejects_unknown_event_type() {
        let mut doc = push_document();
        doc["event_type"] = json!("release");
        assert_eq!(
            Event::from_document(doc),
            Err(ValidationError::UnknownEventType("release".to_string()))
        );
    }

    #[test]
    fn from_document_rejects_non_object() {
        assert_eq!(
            Event::from_document(json!([1, 2])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn from_document_rejects_wrong_optional_shape() {
        let mut doc = push_document();
        doc["request_id"] = json!("seven");
        assert!(matches!(
            Event::from_document(doc),
            Err(ValidationError::InvalidField { field: "document", .. })
        ));
    }

    #[test]
    fn validate_rejects_malformed_timestamp() {
        let mut event = Event::from_document(push_document()).unwrap();
        event.timestamp = "yesterday".to_string();
        assert!(matches!(
            event.validate(),
            Err(ValidationError::InvalidField { field: "timestamp", .. })
        ));
    }

    #[test]
    fn validate_allows_empty_strings() {
        let mut event = Event::from_document(push_document()).unwrap();
        event.author = String::new();
        event.repository = String::new();
        assert!(event.validate().is_ok());
    }

    #[test]
    fn occurred_at_normalizes_offsets() {
        let mut event = Event::from_document(push_document()).unwrap();
        event.timestamp = "2024-01-15T12:00:00+05:00".to_string();
        assert_eq!(
            event.occurred_at(),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap())
        );

        event.timestamp = "yesterday".to_string();
        assert_eq!(event.occurred_at(), None);
    }

    #[test]
    fn stored_event_is_flat_with_nulls() {
        let stored = StoredEvent {
            id: EventId("abc123".to_string()),
            event: Event::from_document(push_document()).unwrap(),
        };
        let value = serde_json::to_value(&stored).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["_id"], json!("abc123"));
        assert_eq!(object["from_branch"], Value::Null);
        assert_eq!(object["action"], Value::Null);
        assert_eq!(object.len(), 11);

        let back = StoredEvent::from_document(value).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn stored_event_requires_id() {
        assert_eq!(
            StoredEvent::from_document(push_document()),
            Err(ValidationError::MissingField("_id"))
        );
    }

    #[test]
    fn format_timestamp_is_fixed_width_utc() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(at), "2024-01-15T10:00:00.000000Z");
    }
}
