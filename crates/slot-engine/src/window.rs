//! Half-open, timezone-aware time windows and the clipping primitive.
//!
//! A [`TimeWindow`] is `[start, end)`. Construction never produces a negative
//! duration: a zero or inverted range collapses to the *empty window*, a
//! zero-length window anchored at `start`. Callers check [`TimeWindow::is_empty`]
//! before using a result; emptiness is a value, not an error.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use serde::Serializer;

use crate::error::{EngineError, Result};

/// A half-open interval `[start, end)` expressed in an IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

impl TimeWindow {
    /// Build a window, collapsing `end <= start` to the empty window at `start`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        if end <= start {
            Self::empty_at(start)
        } else {
            Self { start, end }
        }
    }

    /// Build a window, rejecting zero-length or inverted ranges.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidWindow` when `end <= start`.
    pub fn try_new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidWindow(format!(
                "end {} is not after start {}",
                end.fixed_offset().to_rfc3339(),
                start.fixed_offset().to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from instants in any zone, converting both ends into `tz`.
    pub fn in_timezone<A: TimeZone>(start: &DateTime<A>, end: &DateTime<A>, tz: Tz) -> Self {
        Self::new(start.with_timezone(&tz), end.with_timezone(&tz))
    }

    /// The empty window sentinel, anchored at `at`.
    pub fn empty_at(at: DateTime<Tz>) -> Self {
        Self { start: at, end: at }
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Whole minutes covered by the window (truncated).
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// True if `at` lies inside `[start, end)`.
    pub fn contains(&self, at: DateTime<Tz>) -> bool {
        self.start <= at && at < self.end
    }

    /// Two windows overlap iff `a.start < b.end && b.start < a.end`.
    /// Adjacent windows do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The intersection of two windows, or the empty window at `self.start`.
    pub fn intersect(&self, other: &TimeWindow) -> TimeWindow {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start >= end {
            Self::empty_at(self.start)
        } else {
            Self { start, end }
        }
    }

    /// Re-express both ends in another timezone. The instants do not change.
    pub fn with_timezone(&self, tz: Tz) -> TimeWindow {
        Self {
            start: self.start.with_timezone(&tz),
            end: self.end.with_timezone(&tz),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.fixed_offset().to_rfc3339(),
            self.end.fixed_offset().to_rfc3339()
        )
    }
}

/// Clip `window` to the business day `[day_start, day_end)`.
///
/// The boundaries are those of the day on which the window starts; a window
/// running past midnight is *not* split here. Callers that need every day
/// covered invoke this once per day (see `BusinessHoursPolicy::split_by_day`).
///
/// Returns the empty window when the intersection has no positive length.
pub fn clip(window: &TimeWindow, day_start: DateTime<Tz>, day_end: DateTime<Tz>) -> TimeWindow {
    if window.is_empty() || day_end <= day_start {
        return TimeWindow::empty_at(window.start);
    }
    window.intersect(&TimeWindow {
        start: day_start,
        end: day_end,
    })
}

/// Serialize an instant as RFC 3339 with its numeric UTC offset.
pub(crate) fn serialize_instant<S: Serializer>(
    at: &DateTime<Tz>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&at.fixed_offset().to_rfc3339())
}
