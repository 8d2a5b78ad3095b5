//! Calendar sources supply the busy intervals for a query window.
//!
//! Network-backed providers live outside this crate and implement
//! [`CalendarSource`]. Two sources ship here: [`StaticSource`] for in-memory
//! data and [`JsonFileSource`] for a small provider-neutral JSON document:
//!
//! ```json
//! {"busy": [{"start": "2026-03-16T10:00:00+01:00", "end": "2026-03-16T11:30:00+01:00"}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::freebusy::BusyInterval;
use crate::window::TimeWindow;

/// Supplier of busy intervals.
pub trait CalendarSource {
    /// Busy intervals overlapping `window`, in any order.
    ///
    /// # Errors
    /// Returns `EngineError::SourceUnavailable` when the source cannot answer.
    fn fetch_busy(&self, window: &TimeWindow) -> Result<Vec<BusyInterval>>;
}

/// A fixed list of busy intervals.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    busy: Vec<BusyInterval>,
}

impl StaticSource {
    pub fn new(busy: Vec<BusyInterval>) -> Self {
        Self { busy }
    }
}

impl CalendarSource for StaticSource {
    fn fetch_busy(&self, window: &TimeWindow) -> Result<Vec<BusyInterval>> {
        Ok(overlapping(&self.busy, window))
    }
}

/// Busy intervals read from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    timezone: Tz,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            timezone,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalendarSource for JsonFileSource {
    fn fetch_busy(&self, window: &TimeWindow) -> Result<Vec<BusyInterval>> {
        let json = fs::read_to_string(&self.path).map_err(|e| {
            EngineError::SourceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        let busy = parse_busy_json(&json, self.timezone)?;
        let busy = overlapping(&busy, window);
        debug!(path = %self.path.display(), busy = busy.len(), "fetched busy intervals");
        Ok(busy)
    }
}

#[derive(Debug, Deserialize)]
struct BusyDocument {
    #[serde(default)]
    busy: Vec<BusyEntry>,
}

#[derive(Debug, Deserialize)]
struct BusyEntry {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

/// Parse a busy document, converting every instant into `tz`.
///
/// # Errors
/// Returns `EngineError::SourceUnavailable` if the document is not valid.
pub fn parse_busy_json(json: &str, tz: Tz) -> Result<Vec<BusyInterval>> {
    let doc: BusyDocument = serde_json::from_str(json)
        .map_err(|e| EngineError::SourceUnavailable(format!("invalid busy document: {}", e)))?;
    Ok(doc
        .busy
        .iter()
        .map(|entry| BusyInterval::new(entry.start.with_timezone(&tz), entry.end.with_timezone(&tz)))
        .collect())
}

fn overlapping(busy: &[BusyInterval], window: &TimeWindow) -> Vec<BusyInterval> {
    busy.iter()
        .filter(|b| b.window().overlaps(window))
        .copied()
        .collect()
}
