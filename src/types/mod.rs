//! Core domain types: the stored event record and its identifiers.

pub mod event;
pub mod ids;

pub use event::{CommitSummary, Event, EventType, StoredEvent, ValidationError, format_timestamp};
pub use ids::{EventId, PrNumber, SHORT_SHA_LEN, short_sha};
