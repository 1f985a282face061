//! Persistence layer for normalized webhook events.
//!
//! # File Layout
//!
//! ```text
//! <store_root>/<database>/
//!   <collection>.jsonl   # one stored event per line, append-only
//! ```
//!
//! # Crash Safety
//!
//! - Each insert is written as a single line and fsynced before it is acknowledged
//! - The directory is fsynced when the log file is first created
//! - A partial trailing line is truncated when the log is replayed on open

pub mod log;
pub mod store;

pub use log::{EventLog, EventLogError, Replay};
pub use store::{EventStore, FileEventStore, MemoryEventStore, StoreError, open_store};
