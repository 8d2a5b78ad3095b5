//! Quantize free intervals into fixed-length, hour-aligned bookable slots.

use std::fmt;

use chrono::{DateTime, Duration, Timelike};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::freebusy::FreeInterval;
use crate::window::{serialize_instant, TimeWindow};

/// Default length of one bookable unit.
pub const DEFAULT_SLOT_MINUTES: i64 = 60;

/// Longest accepted slot: one day.
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

/// A bookable unit. Identified by its start instant alone; the length is a
/// global setting, not per-slot state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Slot {
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<Tz>,
}

impl Slot {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self { start }
    }

    /// The ledger key of this slot.
    pub fn key(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self, slot_duration: Duration) -> DateTime<Tz> {
        self.start + slot_duration
    }

    pub fn window(&self, slot_duration: Duration) -> TimeWindow {
        TimeWindow::new(self.start, self.end(slot_duration))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.fixed_offset().to_rfc3339())
    }
}

/// Validate a slot length given in minutes.
///
/// # Errors
/// Returns `EngineError::InvalidSlotDuration` for zero or negative lengths and
/// for anything longer than [`MAX_SLOT_MINUTES`].
pub fn slot_duration(minutes: i64) -> Result<Duration> {
    if !(1..=MAX_SLOT_MINUTES).contains(&minutes) {
        return Err(EngineError::InvalidSlotDuration(minutes));
    }
    Duration::try_minutes(minutes).ok_or(EngineError::InvalidSlotDuration(minutes))
}

/// Round `at` up to the next whole hour of its own timezone.
///
/// Any non-zero minute, second or sub-second component advances to the next
/// hour: 09:15 becomes 10:00, 09:00 stays 09:00.
pub fn align_to_hour(at: DateTime<Tz>) -> DateTime<Tz> {
    let past_hour = Duration::minutes(i64::from(at.minute()))
        + Duration::seconds(i64::from(at.second()))
        + Duration::nanoseconds(i64::from(at.nanosecond()));
    if past_hour.is_zero() {
        at
    } else {
        at - past_hour + Duration::hours(1)
    }
}

/// Cut free intervals into hour-aligned slots of `slot_duration`.
///
/// Each interval's start is rounded up with [`align_to_hour`], then slots are
/// emitted back to back while `current + slot_duration <= interval.end`.
/// Remainders shorter than one slot are never offered. Output preserves the
/// chronological order of `free`.
///
/// Only the first slot of each interval is guaranteed to sit on the hour. With
/// a length that is a whole number of hours every slot does; a 30-minute length
/// yields 10:00, 10:30, 11:00 and so on. A slot whose end would fall outside
/// the representable date range is not emitted.
///
/// # Errors
/// Returns `EngineError::InvalidSlotDuration` if `slot_duration` is not positive.
pub fn quantize(free: &[FreeInterval], slot_duration: Duration) -> Result<Vec<Slot>> {
    if slot_duration <= Duration::zero() {
        return Err(EngineError::InvalidSlotDuration(slot_duration.num_minutes()));
    }

    let mut slots = Vec::new();
    for interval in free {
        let mut current = align_to_hour(interval.start);
        while let Some(end) = current.checked_add_signed(slot_duration) {
            if end > interval.end {
                break;
            }
            slots.push(Slot::new(current));
            current = end;
        }
    }

    debug!(
        intervals = free.len(),
        slots = slots.len(),
        slot_minutes = slot_duration.num_minutes(),
        "quantized free intervals"
    );
    Ok(slots)
}
