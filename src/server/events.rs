//! Read endpoints for stored events.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::AppState;
use crate::persistence::StoreError;
use crate::types::{EventType, StoredEvent};

/// Number of events returned when `limit` is absent or unparseable.
pub const DEFAULT_LIMIT: usize = 50;

/// Errors that can occur when reading events.
#[derive(Debug, Error)]
pub enum EventsError {
    /// The store holds no events.
    #[error("No events found")]
    NotFound,

    /// The store failed; the message is passed through unchanged.
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for EventsError {
    fn into_response(self) -> Response {
        let (status, key) = match &self {
            EventsError::NotFound => (StatusCode::NOT_FOUND, "message"),
            EventsError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
        };

        (status, Json(serde_json::json!({ key: self.to_string() }))).into_response()
    }
}

/// Query parameters for `GET /webhook/events`.
///
/// Both are kept as raw strings so a bad `limit` can fall back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub limit: Option<String>,
}

/// How the `type` parameter restricts a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeFilter {
    All,
    Only(EventType),
    /// A type no stored event can have; matches nothing.
    Nothing,
}

impl EventsQuery {
    /// The requested type filter. An empty value means no filter.
    fn filter(&self) -> TypeFilter {
        match self.event_type.as_deref().map(str::trim) {
            None | Some("") => TypeFilter::All,
            Some(raw) => raw
                .parse::<EventType>()
                .map_or(TypeFilter::Nothing, TypeFilter::Only),
        }
    }

    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LIMIT)
    }
}

/// Response body for `GET /webhook/events`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventsPage {
    pub count: usize,
    pub events: Vec<StoredEvent>,
}

/// Lists stored events, newest first.
///
/// # Query Parameters
///
/// - `type` - optional filter: `push`, `pull_request` or `merge`
/// - `limit` - maximum number of events (default 50)
///
/// # Response
///
/// - 200 OK with `{count, events}`; an unknown `type` yields an empty page
/// - 500 Internal Server Error if the store fails
pub async fn events_handler(
    State(app_state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsPage>, EventsError> {
    let filter = query.filter();
    let limit = query.limit();

    let events = match filter {
        TypeFilter::Nothing => Vec::new(),
        TypeFilter::All => list(&app_state, None, limit)?,
        TypeFilter::Only(event_type) => list(&app_state, Some(event_type), limit)?,
    };

    debug!(
        filter = ?filter,
        limit,
        count = events.len(),
        "Listed events"
    );

    Ok(Json(EventsPage {
        count: events.len(),
        events,
    }))
}

fn list(
    app_state: &AppState,
    event_type: Option<EventType>,
    limit: usize,
) -> Result<Vec<StoredEvent>, EventsError> {
    app_state.store().query(event_type, limit).map_err(|e| {
        warn!(error = %e, "Failed to query events");
        EventsError::Store(e)
    })
}

/// Returns the most recent stored event.
///
/// # Response
///
/// - 200 OK with the event record
/// - 404 Not Found with `{"message": "No events found"}` when the store is empty
/// - 500 Internal Server Error if the store fails
pub async fn latest_handler(
    State(app_state): State<AppState>,
) -> Result<Json<StoredEvent>, EventsError> {
    let latest = app_state.store().latest().map_err(|e| {
        warn!(error = %e, "Failed to read latest event");
        EventsError::Store(e)
    })?;

    latest.map(Json).ok_or(EventsError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(event_type: Option<&str>, limit: Option<&str>) -> EventsQuery {
        EventsQuery {
            event_type: event_type.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn filter_parses_known_types() {
        assert_eq!(
            query(Some("push"), None).filter(),
            TypeFilter::Only(EventType::Push)
        );
        assert_eq!(
            query(Some("pull_request"), None).filter(),
            TypeFilter::Only(EventType::PullRequest)
        );
        assert_eq!(
            query(Some("merge"), None).filter(),
            TypeFilter::Only(EventType::Merge)
        );
    }

    #[test]
    fn filter_absent_or_empty_means_all() {
        assert_eq!(query(None, None).filter(), TypeFilter::All);
        assert_eq!(query(Some(""), None).filter(), TypeFilter::All);
    }

    #[test]
    fn filter_unknown_type_matches_nothing() {
        assert_eq!(query(Some("release"), None).filter(), TypeFilter::Nothing);
        assert_eq!(query(Some("PUSH"), None).filter(), TypeFilter::Nothing);
    }

    #[test]
    fn limit_defaults_and_parses() {
        assert_eq!(query(None, None).limit(), DEFAULT_LIMIT);
        assert_eq!(query(None, Some("10")).limit(), 10);
        assert_eq!(query(None, Some("0")).limit(), 0);
        assert_eq!(query(None, Some("ten")).limit(), DEFAULT_LIMIT);
        assert_eq!(query(None, Some("-5")).limit(), DEFAULT_LIMIT);
    }
}
