//! Compute business-hours free intervals from busy periods.
//!
//! Busy intervals are sorted by start time and swept left to right with a
//! running `previous_end`. Overlapping, nested and adjacent busy intervals are
//! absorbed by the sweep itself (`previous_end` only ever grows), so the input
//! needs no separate merge pass. Each gap is clipped to business hours one day
//! at a time before it is emitted.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::policy::BusinessHoursPolicy;
use crate::window::{serialize_instant, TimeWindow};

/// A time range already occupied according to the calendar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    window: TimeWindow,
}

impl BusyInterval {
    /// Inverted or zero-length ranges become empty busy intervals, which the
    /// sweep ignores.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            window: TimeWindow::new(start, end),
        }
    }

    pub fn from_window(window: TimeWindow) -> Self {
        Self { window }
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.window.start()
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.window.end()
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }
}

/// A business-hours-clipped gap between busy intervals. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeInterval {
    #[serde(serialize_with = "serialize_instant")]
    pub start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_instant")]
    pub end: DateTime<Tz>,
    pub duration_minutes: i64,
}

impl FreeInterval {
    /// `None` for the empty window.
    pub fn from_window(window: &TimeWindow) -> Option<Self> {
        if window.is_empty() {
            return None;
        }
        Some(Self {
            start: window.start(),
            end: window.end(),
            duration_minutes: window.duration_minutes(),
        })
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

/// Find the free intervals of `query` given a list of busy intervals.
///
/// `busy` may be unsorted and may contain overlapping, nested or adjacent
/// entries. The result is chronological, clipped to `policy`'s business hours
/// and expressed in the policy timezone. A gap spanning several days yields one
/// interval per day that has business hours inside the gap.
pub fn compute_free(
    query: &TimeWindow,
    busy: &[BusyInterval],
    policy: &BusinessHoursPolicy,
) -> Vec<FreeInterval> {
    let tz = policy.timezone();
    let mut free = Vec::new();
    if query.is_empty() {
        return free;
    }

    let mut sorted: Vec<TimeWindow> = busy
        .iter()
        .filter(|b| !b.window.is_empty())
        .map(|b| b.window.with_timezone(tz))
        .collect();
    sorted.sort_by_key(|w| (w.start(), w.end()));

    let query_end = query.end().with_timezone(&tz);
    let mut previous_end = query.start().with_timezone(&tz);

    for interval in &sorted {
        if interval.start() >= query_end {
            break;
        }
        if interval.start() > previous_end {
            push_clipped(
                &mut free,
                &TimeWindow::new(previous_end, interval.start()),
                policy,
            );
        }
        previous_end = previous_end.max(interval.end());
    }

    if previous_end < query_end {
        push_clipped(&mut free, &TimeWindow::new(previous_end, query_end), policy);
    }

    debug!(
        query = %query,
        busy = sorted.len(),
        free = free.len(),
        "computed free intervals"
    );
    free
}

fn push_clipped(free: &mut Vec<FreeInterval>, gap: &TimeWindow, policy: &BusinessHoursPolicy) {
    free.extend(
        policy
            .clip_each_day(gap)
            .iter()
            .filter_map(FreeInterval::from_window),
    );
}

/// Drop free intervals shorter than `min_duration_minutes`.
pub fn retain_min_duration(free: Vec<FreeInterval>, min_duration_minutes: i64) -> Vec<FreeInterval> {
    free.into_iter()
        .filter(|interval| interval.duration_minutes >= min_duration_minutes)
        .collect()
}

/// Find the first free interval of at least `min_duration_minutes` within the query.
///
/// Delegates to [`compute_free`] and returns the first interval meeting the
/// minimum duration requirement.
pub fn find_first_free(
    query: &TimeWindow,
    busy: &[BusyInterval],
    policy: &BusinessHoursPolicy,
    min_duration_minutes: i64,
) -> Option<FreeInterval> {
    compute_free(query, busy, policy)
        .into_iter()
        .find(|interval| interval.duration_minutes >= min_duration_minutes)
}

/// Merge overlapping or adjacent busy periods, clipped to the query window.
///
/// Returns a sorted, non-overlapping list in the policy timezone. Used for
/// reporting; [`compute_free`] does not depend on it.
pub fn merge_busy(query: &TimeWindow, busy: &[BusyInterval], tz: Tz) -> Vec<TimeWindow> {
    let mut intervals: Vec<TimeWindow> = busy
        .iter()
        .map(|b| b.window.intersect(query))
        .filter(|w| !w.is_empty())
        .map(|w| w.with_timezone(tz))
        .collect();

    intervals.sort_by_key(|w| (w.start(), w.end()));

    let mut merged: Vec<TimeWindow> = Vec::new();
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start() <= last.end() {
                // Overlapping or adjacent: extend the current block.
                *last = TimeWindow::new(last.start(), last.end().max(interval.end()));
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}
