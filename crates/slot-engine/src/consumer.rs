//! Slot consumers attempt external bookings for ledger candidates.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::Result;
use crate::quantize::Slot;

/// Result of one booking attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The external party accepted the slot.
    Booked,
    /// The external party does not offer this slot; try the next one.
    Rejected,
}

/// An external actor that tries to book one concrete slot at a time.
pub trait SlotConsumer {
    /// # Errors
    /// Returns `EngineError::Booking` when the attempt itself failed, as opposed
    /// to the slot being turned down.
    fn attempt(&mut self, slot: &Slot) -> Result<BookingOutcome>;
}

impl<F> SlotConsumer for F
where
    F: FnMut(&Slot) -> Result<BookingOutcome>,
{
    fn attempt(&mut self, slot: &Slot) -> Result<BookingOutcome> {
        self(slot)
    }
}

/// Accepts a slot only if the external party listed its start time as an option.
///
/// Each offered start can be booked once.
#[derive(Debug, Clone, Default)]
pub struct OfferListConsumer {
    offered: HashSet<DateTime<Utc>>,
    booked: Vec<Slot>,
}

impl OfferListConsumer {
    pub fn new<Z: TimeZone>(offered: impl IntoIterator<Item = DateTime<Z>>) -> Self {
        Self {
            offered: offered.into_iter().map(|at| at.with_timezone(&Utc)).collect(),
            booked: Vec::new(),
        }
    }

    /// Slots booked so far, in booking order.
    pub fn booked(&self) -> &[Slot] {
        &self.booked
    }
}

impl SlotConsumer for OfferListConsumer {
    fn attempt(&mut self, slot: &Slot) -> Result<BookingOutcome> {
        if self.offered.remove(&slot.start.with_timezone(&Utc)) {
            self.booked.push(*slot);
            Ok(BookingOutcome::Booked)
        } else {
            Ok(BookingOutcome::Rejected)
        }
    }
}
