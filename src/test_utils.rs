//! Shared test fixtures and arbitrary generators for property-based testing.

use crate::types::{
    CommitSummary, Event, EventId, EventType, PrNumber, StoredEvent, format_timestamp,
};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

/// A minimal valid event of the given type.
pub fn event_at(event_type: EventType, timestamp: &str) -> Event {
    let is_push = event_type == EventType::Push;
    Event {
        author: "alice".to_string(),
        action: (!is_push).then(|| "opened".to_string()),
        to_branch: Some("main".to_string()),
        from_branch: (!is_push).then(|| "feature".to_string()),
        event_type,
        timestamp: timestamp.to_string(),
        repository: "org/repo".to_string(),
        request_id: (!is_push).then_some(PrNumber(1)),
        commits: is_push.then(Vec::new),
        message: Some(String::new()),
    }
}

pub fn sample_push(timestamp: &str) -> StoredEvent {
    let mut event = event_at(EventType::Push, timestamp);
    event.commits = Some(vec![CommitSummary {
        id: "abcdef1".to_string(),
        message: "fix bug".to_string(),
        author: "Alice".to_string(),
        timestamp: "2024-01-15T09:59:00Z".to_string(),
    }]);
    event.message = Some("fix bug".to_string());
    StoredEvent {
        id: EventId::generate(),
        event,
    }
}

pub fn sample_pull_request(timestamp: &str, merged: bool) -> StoredEvent {
    let event_type = if merged {
        EventType::Merge
    } else {
        EventType::PullRequest
    };
    StoredEvent {
        id: EventId::generate(),
        event: event_at(event_type, timestamp),
    }
}

pub fn arb_event_type() -> impl Strategy<Value = EventType> {
    prop_oneof![
        Just(EventType::Push),
        Just(EventType::PullRequest),
        Just(EventType::Merge),
    ]
}

/// Timestamps in the fixed format the classifier produces, spread over a year.
pub fn arb_timestamp() -> impl Strategy<Value = String> {
    (0i64..31_536_000, 0u32..1_000_000).prop_map(|(secs, micros)| {
        let base: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let at = base
            + chrono::Duration::seconds(secs)
            + chrono::Duration::microseconds(i64::from(micros));
        format_timestamp(at)
    })
}

pub fn arb_commit() -> impl Strategy<Value = CommitSummary> {
    ("[0-9a-f]{7}", "[a-zA-Z0-9 .,]{0,40}", "[a-zA-Z ]{0,20}").prop_map(|(id, message, author)| {
        CommitSummary {
            id,
            message,
            author,
            timestamp: String::new(),
        }
    })
}

pub fn arb_event() -> impl Strategy<Value = Event> {
    (
        arb_event_type(),
        arb_timestamp(),
        "[a-z][a-z0-9-]{0,15}",
        "[a-z]{1,10}/[a-z]{1,10}",
        "[a-z][a-z0-9/_-]{0,30}",
        prop::collection::vec(arb_commit(), 0..4),
        1u64..100_000,
    )
        .prop_map(|(event_type, timestamp, author, repository, branch, commits, number)| {
            let mut event = event_at(event_type, &timestamp);
            event.author = author;
            event.repository = repository;
            event.to_branch = Some(branch);
            if event_type == EventType::Push {
                event.commits = Some(commits);
            } else {
                event.request_id = Some(PrNumber(number));
            }
            event
        })
}

pub fn arb_stored_event() -> impl Strategy<Value = StoredEvent> {
    arb_event().prop_map(|event| StoredEvent {
        id: EventId::generate(),
        event,
    })
}
