//! The event store: insert, filtered query, and most-recent lookup.
//!
//! [`EventStore`] is the seam between the HTTP layer and storage. Two
//! implementations are provided:
//! - [`FileEventStore`]: durable, backed by an [`EventLog`] file
//! - [`MemoryEventStore`]: in-process only, for tests and throwaway runs
//!
//! Both keep every record in insertion order and answer reads from that
//! sequence. Ordering is by the instant `timestamp` denotes, newest first;
//! records at the same instant come back most-recently-inserted first.

use std::cmp::Reverse;
use std::path::Path;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::log::{EventLog, EventLogError};
use crate::config::StoreConfig;
use crate::types::{Event, EventId, EventType, StoredEvent, ValidationError};

/// Errors that can occur while talking to a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event was rejected by schema validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backing log could not be read or written.
    #[error("storage error: {0}")]
    Log(#[from] EventLogError),

    /// The storage URL names a backend this build does not provide.
    #[error("unsupported storage URL: {0}")]
    UnsupportedUrl(String),

    /// A previous writer panicked while holding the store lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence contract for normalized events.
///
/// Implementations never deduplicate: each `insert` creates a new record with
/// a fresh identifier.
pub trait EventStore: Send + Sync {
    /// Validates and persists one event, returning its new identifier.
    fn insert(&self, event: Event) -> Result<EventId>;

    /// Returns up to `limit` records, newest first, optionally restricted to
    /// one event type.
    fn query(&self, event_type: Option<EventType>, limit: usize) -> Result<Vec<StoredEvent>>;

    /// Returns the newest record, or `None` if the store is empty.
    fn latest(&self) -> Result<Option<StoredEvent>>;
}

/// Selects records for a query from an insertion-ordered slice.
fn select(
    records: &[StoredEvent],
    event_type: Option<EventType>,
    limit: usize,
) -> Vec<StoredEvent> {
    let mut matching: Vec<&StoredEvent> = records
        .iter()
        .rev()
        .filter(|r| event_type.is_none_or(|t| r.event.event_type == t))
        .collect();
    // Stable sort: equal instants keep newest-inserted first.
    matching.sort_by_cached_key(|r| Reverse(r.event.occurred_at()));
    matching.into_iter().take(limit).cloned().collect()
}

/// Finds the newest record in an insertion-ordered slice.
fn newest(records: &[StoredEvent]) -> Option<StoredEvent> {
    records
        .iter()
        .rev()
        .map(|r| (r.event.occurred_at(), r))
        .reduce(|best, next| if next.0 > best.0 { next } else { best })
        .map(|(_, r)| r.clone())
}

/// In-process store. Contents are lost when it is dropped.
#[derive(Default)]
pub struct MemoryEventStore {
    records: Mutex<Vec<StoredEvent>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryEventStore {
    fn insert(&self, event: Event) -> Result<EventId> {
        event.validate()?;
        let id = EventId::generate();
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.push(StoredEvent {
            id: id.clone(),
            event,
        });
        Ok(id)
    }

    fn query(&self, event_type: Option<EventType>, limit: usize) -> Result<Vec<StoredEvent>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(select(&records, event_type, limit))
    }

    fn latest(&self) -> Result<Option<StoredEvent>> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(newest(&records))
    }
}

/// Durable store backed by a JSON Lines file.
///
/// The file is replayed once on open; afterwards reads are served from the
/// replayed records and every insert is appended and fsynced before the
/// in-memory copy is updated.
pub struct FileEventStore {
    inner: Mutex<FileStoreInner>,
}

struct FileStoreInner {
    log: EventLog,
    records: Vec<StoredEvent>,
}

impl FileEventStore {
    /// Opens (or creates) the store at `path`, replaying existing records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let replay = EventLog::replay(path)?;
        if replay.truncated {
            warn!(path = %path.display(), "Truncated partial record at end of event log");
        }
        if replay.skipped > 0 {
            warn!(
                path = %path.display(),
                skipped = replay.skipped,
                "Ignored stored records that fail validation"
            );
        }

        let log = EventLog::open(path).map_err(EventLogError::from)?;
        info!(
            path = %path.display(),
            records = replay.records.len(),
            "Opened event store"
        );

        Ok(FileEventStore {
            inner: Mutex::new(FileStoreInner {
                log,
                records: replay.records,
            }),
        })
    }
}

impl EventStore for FileEventStore {
    fn insert(&self, event: Event) -> Result<EventId> {
        event.validate()?;
        let record = StoredEvent {
            id: EventId::generate(),
            event,
        };

        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner.log.append(&record)?;
        debug!(
            event_id = %record.id,
            path = %inner.log.path().display(),
            "Appended event to log"
        );

        let id = record.id.clone();
        inner.records.push(record);
        Ok(id)
    }

    fn query(&self, event_type: Option<EventType>, limit: usize) -> Result<Vec<StoredEvent>> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(select(&inner.records, event_type, limit))
    }

    fn latest(&self) -> Result<Option<StoredEvent>> {
        let inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(newest(&inner.records))
    }
}

/// Connects to the store described by `config`.
///
/// Supported URLs:
/// - `memory://` — a fresh [`MemoryEventStore`]
/// - `file://<dir>` or a bare path — a [`FileEventStore`] at
///   `<dir>/<database>/<collection>.jsonl`
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn EventStore>> {
    let url = config.url.trim();

    if url == "memory://" || url == "memory:" {
        info!("Using in-memory event store");
        return Ok(Arc::new(MemoryEventStore::new()));
    }

    let root = match url.strip_prefix("file://") {
        Some(rest) => rest,
        None if !url.contains("://") => url,
        None => return Err(StoreError::UnsupportedUrl(url.to_string())),
    };
    if root.is_empty() {
        return Err(StoreError::UnsupportedUrl(url.to_string()));
    }

    let path = Path::new(root)
        .join(&config.database)
        .join(format!("{}.jsonl", config.collection));
    Ok(Arc::new(FileEventStore::open(path)?))
}
