//! Persistence for the slot ledger.
//!
//! The ledger talks to durable storage only through [`SlotStore::load`] and
//! [`SlotStore::save`]. [`FileStore`] keeps a plain, line-oriented text file:
//!
//! ```text
//! slot-ledger v1
//! 2026-03-16T08:00:00+01:00
//! 2026-03-16T09:00:00+01:00
//! ```
//!
//! The header line comes first, then one RFC 3339 timestamp per slot with its
//! numeric UTC offset. Blank lines and `#` comments are ignored. The file is
//! parsed as data, never evaluated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::quantize::Slot;

/// First meaningful line of every ledger file.
pub const LEDGER_HEADER: &str = "slot-ledger v1";

/// Durable home of the available-slot set.
pub trait SlotStore {
    /// Read the persisted slots in ledger order. A store that was never written
    /// yields an empty list.
    fn load(&self) -> Result<Vec<Slot>>;

    /// Replace the persisted slots with `slots`, in order.
    fn save(&self, slots: &[Slot]) -> Result<()>;
}

/// Line-oriented text file store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    timezone: Tz,
}

impl FileStore {
    /// Loaded timestamps are re-expressed in `timezone`.
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> EngineError {
        EngineError::StoreIo {
            path: self.path.clone(),
            source,
        }
    }
}

impl SlotStore for FileStore {
    fn load(&self) -> Result<Vec<Slot>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no ledger file yet");
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        parse_ledger(&content, self.timezone)
    }

    fn save(&self, slots: &[Slot]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        // Write beside the target, then rename over it.
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, render_ledger(slots)).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), slots = slots.len(), "saved ledger");
        Ok(())
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<Vec<Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slots(slots: Vec<Slot>) -> Self {
        Self {
            slots: Mutex::new(slots),
        }
    }
}

impl SlotStore for MemoryStore {
    fn load(&self) -> Result<Vec<Slot>> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, slots: &[Slot]) -> Result<()> {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner) = slots.to_vec();
        Ok(())
    }
}

/// Render slots in the ledger file format.
pub fn render_ledger(slots: &[Slot]) -> String {
    let mut out = String::with_capacity(LEDGER_HEADER.len() + 1 + slots.len() * 26);
    out.push_str(LEDGER_HEADER);
    out.push('\n');
    for slot in slots {
        out.push_str(&slot.start.fixed_offset().to_rfc3339());
        out.push('\n');
    }
    out
}

/// Parse the ledger file format, converting every timestamp into `tz`.
///
/// A file with no meaningful lines parses as an empty ledger.
///
/// # Errors
/// Returns `EngineError::StoreFormat` for a wrong header or a malformed timestamp.
pub fn parse_ledger(content: &str, tz: Tz) -> Result<Vec<Slot>> {
    let mut slots = Vec::new();
    let mut seen_header = false;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if !seen_header {
            if trimmed != LEDGER_HEADER {
                return Err(EngineError::StoreFormat {
                    line: idx + 1,
                    message: format!("expected header '{}', found '{}'", LEDGER_HEADER, trimmed),
                });
            }
            seen_header = true;
            continue;
        }

        let start = DateTime::parse_from_rfc3339(trimmed).map_err(|e| EngineError::StoreFormat {
            line: idx + 1,
            message: format!("invalid timestamp '{}': {}", trimmed, e),
        })?;
        slots.push(Slot::new(start.with_timezone(&tz)));
    }

    Ok(slots)
}
