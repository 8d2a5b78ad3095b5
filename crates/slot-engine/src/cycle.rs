//! The availability pipeline: busy periods in, one booked slot out.
//!
//! A refresh cycle runs `fetch -> compute_free -> quantize -> replace_all`.
//! Booking walks the ledger in order using the two-phase discipline:
//! `reserve`, attempt the external booking, then `commit` on success or
//! `release` otherwise.

use chrono::{DateTime, Duration, TimeZone};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::consumer::{BookingOutcome, SlotConsumer};
use crate::error::{EngineError, Result};
use crate::freebusy::{self, BusyInterval, FreeInterval};
use crate::ledger::SlotLedger;
use crate::policy::BusinessHoursPolicy;
use crate::quantize::{self, Slot};
use crate::source::CalendarSource;
use crate::window::TimeWindow;

/// What one refresh cycle produced.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    /// The query window handed to the calendar source.
    pub window: TimeWindow,
    /// Busy intervals the source returned.
    pub busy: Vec<BusyInterval>,
    /// Free intervals after clipping and minimum-duration filtering.
    pub free: Vec<FreeInterval>,
    /// Slots installed in the ledger, in ledger order.
    pub slots: Vec<Slot>,
    /// Ledger epoch started by this refresh.
    pub epoch: u64,
}

/// Free intervals and slots computed for one query, without touching a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub free: Vec<FreeInterval>,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    policy: BusinessHoursPolicy,
    slot_duration: Duration,
    horizon_days: u32,
    min_free_minutes: i64,
}

impl Scheduler {
    /// # Errors
    /// Returns `EngineError::InvalidSlotDuration` for a non-positive slot length.
    pub fn new(policy: BusinessHoursPolicy, slot_duration: Duration) -> Result<Self> {
        if slot_duration <= Duration::zero() {
            return Err(EngineError::InvalidSlotDuration(slot_duration.num_minutes()));
        }
        Ok(Self {
            policy,
            slot_duration,
            horizon_days: crate::config::DEFAULT_HORIZON_DAYS,
            min_free_minutes: 0,
        })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config.policy()?, config.slot_duration()?)?
            .with_horizon_days(config.horizon_days)
            .with_min_free_minutes(config.min_free_minutes))
    }

    /// Capped at [`MAX_HORIZON_DAYS`](crate::config::MAX_HORIZON_DAYS).
    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days.min(crate::config::MAX_HORIZON_DAYS);
        self
    }

    pub fn with_min_free_minutes(mut self, minutes: i64) -> Self {
        self.min_free_minutes = minutes;
        self
    }

    pub fn policy(&self) -> &BusinessHoursPolicy {
        &self.policy
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    /// The query window a refresh at `now` covers.
    pub fn horizon<Z: TimeZone>(&self, now: &DateTime<Z>) -> TimeWindow {
        self.policy.booking_horizon(now, self.horizon_days)
    }

    /// Compute free intervals and slots for `query`. Pure.
    pub fn plan(&self, query: &TimeWindow, busy: &[BusyInterval]) -> Result<Plan> {
        let free = freebusy::retain_min_duration(
            freebusy::compute_free(query, busy, &self.policy),
            self.min_free_minutes,
        );
        let slots = quantize::quantize(&free, self.slot_duration)?;
        Ok(Plan { free, slots })
    }

    /// Run a refresh cycle over the booking horizon at `now`.
    ///
    /// # Errors
    /// Returns the source's error (normally `SourceUnavailable`); the ledger is
    /// left exactly as it was.
    pub fn refresh<C, Z>(
        &self,
        ledger: &SlotLedger,
        source: &C,
        now: &DateTime<Z>,
    ) -> Result<RefreshReport>
    where
        C: CalendarSource + ?Sized,
        Z: TimeZone,
    {
        self.refresh_window(ledger, source, &self.horizon(now))
    }

    /// Run a refresh cycle over an explicit query window.
    pub fn refresh_window<C>(
        &self,
        ledger: &SlotLedger,
        source: &C,
        query: &TimeWindow,
    ) -> Result<RefreshReport>
    where
        C: CalendarSource + ?Sized,
    {
        let query = query.with_timezone(self.policy.timezone());
        let busy = source.fetch_busy(&query).inspect_err(|e| {
            warn!(window = %query, error = %e, "calendar fetch failed, ledger untouched");
        })?;

        let Plan { free, slots } = self.plan(&query, &busy)?;
        if slots.is_empty() {
            info!(window = %query, "no availability in window");
        }
        ledger.replace_all(slots.iter().copied());

        Ok(RefreshReport {
            window: query,
            busy,
            free,
            slots,
            epoch: ledger.epoch(),
        })
    }

    /// Book the first ledger candidate the consumer accepts.
    ///
    /// Returns `Ok(None)` when every available slot was rejected (or none is
    /// left). A consumer error releases the slot under attempt and is returned
    /// as-is; slots tried earlier in the walk stay available.
    pub fn book_next<C>(&self, ledger: &SlotLedger, consumer: &mut C) -> Result<Option<Slot>>
    where
        C: SlotConsumer + ?Sized,
    {
        let candidates = ledger.peek_ordered();
        debug!(candidates = candidates.len(), epoch = candidates.epoch(), "booking walk");

        for slot in candidates {
            if !ledger.reserve(slot.start) {
                debug!(slot = %slot, "slot taken by another consumer");
                continue;
            }

            match consumer.attempt(&slot) {
                Ok(BookingOutcome::Booked) => {
                    // A refresh may have put this start back as available.
                    if !ledger.commit(slot.start) && ledger.consume(slot.start) {
                        warn!(slot = %slot, "booked slot reappeared during the attempt, consumed");
                    }
                    info!(slot = %slot, "slot booked");
                    return Ok(Some(slot));
                }
                Ok(BookingOutcome::Rejected) => {
                    ledger.release(slot.start);
                    debug!(slot = %slot, "slot rejected");
                }
                Err(e) => {
                    ledger.release(slot.start);
                    warn!(slot = %slot, error = %e, "booking attempt failed");
                    return Err(e);
                }
            }
        }

        info!("no candidate slot was accepted");
        Ok(None)
    }
}
