//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, classifies them, and stores recorded
//! events before answering with a per-kind summary.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::persistence::StoreError;
use crate::types::{EventId, EventType, PrNumber};
use crate::webhooks::{Classification, classify};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Event kind assumed when the header is missing.
const DEFAULT_EVENT_KIND: &str = "unknown";
/// The only accepted media type.
const JSON_MEDIA_TYPE: &str = "application/json";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Content-Type header missing or not JSON.
    #[error("Content-Type must be application/json")]
    UnsupportedContentType,

    /// Body is not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Body is blank, `null`, or an empty object.
    #[error("Empty payload")]
    EmptyPayload,

    /// Body is JSON but not an object.
    #[error("Payload must be a JSON object")]
    NotAnObject,

    /// The store failed; the message is passed through unchanged.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::UnsupportedContentType
            | WebhookError::InvalidJson(_)
            | WebhookError::EmptyPayload
            | WebhookError::NotAnObject => StatusCode::BAD_REQUEST,
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Acknowledgement for a `ping` delivery.
#[derive(Debug, Serialize)]
pub struct PingReply {
    pub message: &'static str,
    pub zen: String,
    pub hook_id: Value,
}

/// Summary of a stored push.
#[derive(Debug, Serialize)]
pub struct PushReply {
    pub message: &'static str,
    pub event_id: EventId,
    pub author: String,
    pub branch: String,
    pub commit_count: usize,
}

/// Summary of a stored pull request event.
#[derive(Debug, Serialize)]
pub struct PullRequestReply {
    pub message: String,
    pub event_id: EventId,
    pub action: String,
    pub pr_number: Option<PrNumber>,
    pub is_merged: bool,
}

/// Acknowledgement for an event kind that is not recorded.
#[derive(Debug, Serialize)]
pub struct IgnoredReply {
    pub message: String,
    pub status: &'static str,
}

/// Body of a successful webhook response.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WebhookReply {
    Ping(PingReply),
    Push(PushReply),
    PullRequest(PullRequestReply),
    Ignored(IgnoredReply),
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - `Content-Type: application/json` (required)
/// - `X-GitHub-Event`: event kind (defaults to `"unknown"`)
/// - Body: JSON object as sent by GitHub
///
/// # Response
///
/// - 200 OK: ping acknowledged, event stored, or kind ignored
/// - 400 Bad Request: wrong content type, malformed or empty body
/// - 500 Internal Server Error: store failure
///
/// # Example
///
/// ```ignore
/// POST /webhook/github HTTP/1.1
/// X-GitHub-Event: push
/// Content-Type: application/json
///
/// {"ref": "refs/heads/main", "pusher": {"name": "alice"}, ...}
///
/// HTTP/1.1 200 OK
///
/// {"message": "Push event processed successfully", "event_id": "...",
///  "author": "alice", "branch": "main", "commit_count": 1}
/// ```
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookReply>, WebhookError> {
    if !is_json_content_type(&headers) {
        warn!("Rejected webhook with non-JSON content type");
        return Err(WebhookError::UnsupportedContentType);
    }

    let payload = parse_payload(&body)?;

    let event_kind = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_EVENT_KIND)
        .to_string();

    debug!(event_kind = %event_kind, bytes = body.len(), "Received webhook");

    let reply = match classify(&event_kind, &payload) {
        Classification::Ping { zen, hook_id } => {
            info!(hook_id = %hook_id, "Ping received, webhook configured");
            WebhookReply::Ping(PingReply {
                message: "Pong! Webhook configured successfully",
                zen,
                hook_id,
            })
        }
        Classification::Ignored { event_kind } => {
            debug!(event_kind = %event_kind, "Ignoring unhandled event kind");
            WebhookReply::Ignored(IgnoredReply {
                message: format!("Event '{}' received but not processed", event_kind),
                status: "ignored",
            })
        }
        Classification::Record(event) => {
            let event_type = event.event_type;
            let author = event.author.clone();
            let branch = event.to_branch.clone().unwrap_or_default();
            let commit_count = event.commits.as_ref().map_or(0, Vec::len);
            let action = event.action.clone().unwrap_or_default();
            let pr_number = event.request_id;

            let event_id = app_state.store().insert(event).map_err(|e| {
                warn!(event_kind = %event_kind, error = %e, "Failed to store event");
                WebhookError::Store(e)
            })?;

            info!(
                event_id = %event_id,
                event_type = %event_type,
                author = %author,
                "Event stored"
            );

            match event_type {
                EventType::Push => WebhookReply::Push(PushReply {
                    message: "Push event processed successfully",
                    event_id,
                    author,
                    branch,
                    commit_count,
                }),
                EventType::PullRequest | EventType::Merge => {
                    WebhookReply::PullRequest(PullRequestReply {
                        message: format!("Pull request ({}) processed successfully", action),
                        event_id,
                        action,
                        pr_number,
                        is_merged: event_type == EventType::Merge,
                    })
                }
            }
        }
    };

    Ok(Json(reply))
}

/// Returns true if the declared media type is `application/json`.
///
/// Only the media type before any `;` is checked, so
/// `application/json; charset=utf-8` is accepted on purpose. The media type
/// is compared case-insensitively (RFC 9110 section 8.3.1).
fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
}

/// Parses the body into a non-empty JSON object.
fn parse_payload(body: &[u8]) -> Result<Value, WebhookError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(WebhookError::EmptyPayload);
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) if map.is_empty() => Err(WebhookError::EmptyPayload),
        Value::Null => Err(WebhookError::EmptyPayload),
        object @ Value::Object(_) => Ok(object),
        _ => Err(WebhookError::NotAnObject),
    }
}
