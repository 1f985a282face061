//! Append-only record log with crash-safe replay.
//!
//! The log uses JSON Lines format: one stored event per line. This format is
//! crash-safe because:
//! - A record is only durable once its trailing newline has been fsynced
//! - A partial last line (crash mid-write) is detected and truncated on replay
//!
//! Complete lines that are corrupt or fail schema validation are skipped
//! rather than truncated, so one bad record never hides the records after it.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::types::StoredEvent;

/// Errors that can occur during record log operations.
#[derive(Debug, Error)]
pub enum EventLogError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for record log operations.
pub type Result<T> = std::result::Result<T, EventLogError>;

/// Outcome of replaying a log file.
#[derive(Debug, Default)]
pub struct Replay {
    /// Valid records, in the order they were appended.
    pub records: Vec<StoredEvent>,
    /// Number of complete lines dropped as unparseable or invalid.
    pub skipped: usize,
    /// Whether a partial tail was cut off the file.
    pub truncated: bool,
}

/// An append-only log of stored events.
pub struct EventLog {
    /// The underlying file handle, opened for append.
    file: File,
    /// Path to the log file.
    path: PathBuf,
}

impl EventLog {
    /// Opens an existing log file or creates a new one.
    ///
    /// Missing parent directories are created. When the file is new, its
    /// directory is fsynced so the entry survives a power loss.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);

        if let Some(dir) = &parent {
            fs::create_dir_all(dir)?;
        }

        let existed = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        if !existed && let Some(dir) = &parent {
            fsync_dir(dir)?;
        }

        Ok(EventLog { file, path })
    }

    /// Appends a record and fsyncs it before returning.
    pub fn append(&mut self, record: &StoredEvent) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.write_all(&line)?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays every record in the file, truncating any partial line at EOF.
    ///
    /// A missing file replays as empty. A final line without its newline is a
    /// torn write: the file is cut back to the start of that line so later
    /// appends begin on a clean boundary. Complete lines that are not valid
    /// JSON or fail validation are counted in [`Replay::skipped`].
    pub fn replay(path: impl AsRef<Path>) -> Result<Replay> {
        let path = path.as_ref();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replay::default()),
            Err(e) => return Err(e.into()),
        };
        let file_len = file.metadata()?.len();

        let mut reader = BufReader::new(file);
        let mut replay = Replay::default();
        let mut last_valid_pos = 0u64;
        let mut current_pos = 0u64;

        loop {
            let mut line = String::new();
            let bytes_read = reader.read_line(&mut line)?;

            if bytes_read == 0 {
                break;
            }

            let line_start = current_pos;
            current_pos += bytes_read as u64;

            if !line.ends_with('\n') {
                // Never fsynced as a whole record.
                last_valid_pos = line_start;
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                last_valid_pos = current_pos;
                continue;
            }

            last_valid_pos = current_pos;

            let document = match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(document) => document,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        offset = line_start,
                        error = %e,
                        "Skipping stored line that is not valid JSON"
                    );
                    replay.skipped += 1;
                    continue;
                }
            };

            match StoredEvent::from_document(document) {
                Ok(record) => replay.records.push(record),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        offset = line_start,
                        error = %e,
                        "Skipping stored record that fails validation"
                    );
                    replay.skipped += 1;
                }
            }
        }

        if last_valid_pos < file_len {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(last_valid_pos)?;
            file.sync_all()?;
            replay.truncated = true;
        }

        Ok(replay)
    }
}

/// Syncs a directory so newly created entries in it are durable.
fn fsync_dir(dir: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).open(dir)?.sync_all()
}
