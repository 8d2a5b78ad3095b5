//! Business-hours policy: the daily bookable window in a fixed IANA timezone.
//!
//! All downstream computation runs in the policy's timezone. Instants arriving in
//! UTC or another zone are converted on the way in, and everything the engine
//! hands back is expressed in this zone.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{EngineError, Result};
use crate::window::{self, TimeWindow};

/// Quarter-hour steps searched forward out of a DST gap: 26 hours.
const MAX_GAP_STEPS: i64 = 26 * 4;

/// The bookable hours of every calendar day, e.g. 08:00-22:00 Europe/Amsterdam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHoursPolicy {
    timezone: Tz,
    day_start: NaiveTime,
    day_end: NaiveTime,
}

impl BusinessHoursPolicy {
    /// # Errors
    /// Returns `EngineError::InvalidConfig` unless `day_start < day_end`.
    pub fn new(timezone: Tz, day_start: NaiveTime, day_end: NaiveTime) -> Result<Self> {
        if day_start >= day_end {
            return Err(EngineError::InvalidConfig(format!(
                "business day must open before it closes ({} >= {})",
                day_start.format("%H:%M"),
                day_end.format("%H:%M")
            )));
        }
        Ok(Self {
            timezone,
            day_start,
            day_end,
        })
    }

    /// Build a policy from an IANA zone id and `HH:MM` (or `HH:MM:SS`) strings.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidTimezone` for an unknown zone id and
    /// `EngineError::InvalidConfig` for unparseable or inverted times.
    pub fn from_names(timezone: &str, day_start: &str, day_end: &str) -> Result<Self> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(timezone.to_string()))?;
        Self::new(tz, parse_time_of_day(day_start)?, parse_time_of_day(day_end)?)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    pub fn day_end(&self) -> NaiveTime {
        self.day_end
    }

    /// The calendar date of `at` in the policy timezone.
    pub fn local_date<A: TimeZone>(&self, at: &DateTime<A>) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    /// Resolve a wall-clock time in the policy timezone.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
    /// fall in a gap move forward to the first valid wall-clock time after it;
    /// gaps of up to a whole day (Pacific/Apia skipped 2011-12-30) are covered.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        if let Some(at) = self.timezone.from_local_datetime(&naive).earliest() {
            return at;
        }
        for step in 1..=MAX_GAP_STEPS {
            let shifted = naive + Duration::minutes(15 * step);
            if let Some(at) = self.timezone.from_local_datetime(&shifted).earliest() {
                return at;
            }
        }
        // Read the wall-clock time with the offset in force at that moment.
        let offset = self.timezone.offset_from_utc_datetime(&naive).fix();
        self.timezone
            .from_utc_datetime(&(naive - Duration::seconds(i64::from(offset.local_minus_utc()))))
    }

    /// Open and close instants for `date`.
    pub fn bounds_for(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow::new(
            self.localize(date.and_time(self.day_start)),
            self.localize(date.and_time(self.day_end)),
        )
    }

    /// Clip `window` to the business hours of the day it starts on.
    pub fn clip(&self, window: &TimeWindow) -> TimeWindow {
        let bounds = self.bounds_for(self.local_date(&window.start()));
        window::clip(window, bounds.start(), bounds.end())
    }

    /// Cut `window` at every local midnight it crosses.
    ///
    /// The pieces are contiguous, chronological and never empty.
    pub fn split_by_day(&self, window: &TimeWindow) -> Vec<TimeWindow> {
        let mut pieces = Vec::new();
        let mut cursor = window.start();

        while cursor < window.end() {
            let piece_end = match self.local_date(&cursor).succ_opt() {
                Some(next_day) => {
                    let midnight = self.localize(next_day.and_time(NaiveTime::MIN));
                    if midnight > cursor {
                        midnight.min(window.end())
                    } else {
                        window.end()
                    }
                }
                None => window.end(),
            };
            pieces.push(TimeWindow::new(cursor, piece_end));
            cursor = piece_end;
        }

        pieces
    }

    /// Clip every day `window` touches to that day's business hours.
    ///
    /// Empty clips (e.g. the overnight part of a window) are dropped.
    pub fn clip_each_day(&self, window: &TimeWindow) -> Vec<TimeWindow> {
        self.split_by_day(window)
            .iter()
            .map(|piece| self.clip(piece))
            .filter(|clipped| !clipped.is_empty())
            .collect()
    }

    /// The query window for a refresh cycle run at `now`.
    ///
    /// Starts at today's opening time if `now` is earlier, otherwise at `now`.
    /// Ends at the closing time `days` calendar days after today (`0` means
    /// today's close). Empty once `now` is past that close.
    pub fn booking_horizon<A: TimeZone>(&self, now: &DateTime<A>, days: u32) -> TimeWindow {
        let now = now.with_timezone(&self.timezone);
        let today = self.local_date(&now);
        let open = self.bounds_for(today).start();
        let start = if now < open { open } else { now };

        let last_day = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        TimeWindow::new(start, self.bounds_for(last_day).end())
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
///
/// # Errors
/// Returns `EngineError::InvalidConfig` if neither format matches.
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| EngineError::InvalidConfig(format!("invalid time of day: '{}'", raw)))
}
