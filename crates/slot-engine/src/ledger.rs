//! The slot ledger: the authoritative set of slots that are still bookable.
//!
//! Entries keep the order they were installed in by [`SlotLedger::replace_all`]
//! and are unique by start instant. Every mutation takes the ledger lock once, so
//! check-and-remove is a single indivisible step: two callers can never both
//! see `true` for the same key.
//!
//! Per-slot lifecycle within one epoch:
//!
//! ```text
//! Available --consume--------------> Removed
//! Available --reserve--> Reserved --commit--> Removed
//!                        Reserved --release-> Available
//! ```
//!
//! A new epoch starts only with `replace_all`, which may bring back a start
//! instant that an earlier epoch removed. Reservations whose start is still in
//! the new set carry over into the new epoch.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use chrono_tz::Tz;
use tracing::{debug, info};

use crate::error::Result;
use crate::quantize::Slot;
use crate::store::SlotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Available,
    /// Taken out of circulation while an external booking is in flight.
    Reserved,
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<(Slot, SlotState)>,
    epoch: u64,
}

impl LedgerState {
    fn position(&self, key: DateTime<Tz>, state: SlotState) -> Option<usize> {
        self.entries
            .iter()
            .position(|(slot, s)| slot.start == key && *s == state)
    }
}

#[derive(Debug, Default)]
pub struct SlotLedger {
    state: Mutex<LedgerState>,
}

impl SlotLedger {
    /// An empty ledger at epoch 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger holding `slots` as its first epoch. Duplicates keep the first.
    pub fn from_slots(slots: impl IntoIterator<Item = Slot>) -> Self {
        let ledger = Self::new();
        ledger.replace_all(slots);
        ledger
    }

    /// Rebuild a ledger from durable storage.
    ///
    /// # Errors
    /// Propagates the store's failure unchanged.
    pub fn load_from<S: SlotStore + ?Sized>(store: &S) -> Result<Self> {
        let slots = store.load()?;
        let ledger = Self::new();
        {
            let mut state = ledger.lock();
            state.entries = dedup(slots)
                .into_iter()
                .map(|slot| (slot, SlotState::Available))
                .collect();
        }
        debug!(slots = ledger.len(), "loaded ledger");
        Ok(ledger)
    }

    /// Persist every slot not yet removed.
    ///
    /// Reserved slots are written too: after a crash between `reserve` and
    /// `commit` they come back as available rather than leaking.
    ///
    /// # Errors
    /// Propagates the store's failure unchanged; the in-memory ledger is unaffected.
    pub fn save_to<S: SlotStore + ?Sized>(&self, store: &S) -> Result<()> {
        let slots: Vec<Slot> = self.lock().entries.iter().map(|(slot, _)| *slot).collect();
        store.save(&slots)
    }

    /// Discard every entry and install `slots` in the given order.
    ///
    /// Starts a new epoch. A reservation survives when its start instant is part
    /// of the new set; every other reservation is dropped. Returns the number of
    /// slots installed after removing duplicate start instants.
    pub fn replace_all(&self, slots: impl IntoIterator<Item = Slot>) -> usize {
        let slots = dedup(slots);
        let installed = slots.len();

        let mut state = self.lock();
        let reserved: HashSet<DateTime<Tz>> = state
            .entries
            .iter()
            .filter(|(_, s)| *s == SlotState::Reserved)
            .map(|(slot, _)| slot.start)
            .collect();
        state.entries = slots
            .into_iter()
            .map(|slot| {
                let kept = if reserved.contains(&slot.start) {
                    SlotState::Reserved
                } else {
                    SlotState::Available
                };
                (slot, kept)
            })
            .collect();
        state.epoch += 1;
        info!(epoch = state.epoch, slots = installed, "ledger replaced");
        installed
    }

    /// Remove the available slot starting at `key`.
    ///
    /// Returns `false` when no such slot is available, including when it was
    /// already consumed. Calling it again is always safe.
    pub fn consume(&self, key: DateTime<Tz>) -> bool {
        let mut state = self.lock();
        match state.position(key, SlotState::Available) {
            Some(idx) => {
                let (slot, _) = state.entries.remove(idx);
                info!(slot = %slot, "slot consumed");
                true
            }
            None => {
                debug!(key = %key.fixed_offset().to_rfc3339(), "consume found nothing");
                false
            }
        }
    }

    /// Mark the available slot at `key` as reserved.
    ///
    /// Reserved slots are hidden from [`peek_ordered`](Self::peek_ordered) and
    /// cannot be consumed or reserved again until released.
    pub fn reserve(&self, key: DateTime<Tz>) -> bool {
        let mut state = self.lock();
        match state.position(key, SlotState::Available) {
            Some(idx) => {
                state.entries[idx].1 = SlotState::Reserved;
                debug!(slot = %state.entries[idx].0, "slot reserved");
                true
            }
            None => false,
        }
    }

    /// Remove a reserved slot for good.
    pub fn commit(&self, key: DateTime<Tz>) -> bool {
        let mut state = self.lock();
        match state.position(key, SlotState::Reserved) {
            Some(idx) => {
                let (slot, _) = state.entries.remove(idx);
                info!(slot = %slot, "reservation committed");
                true
            }
            None => false,
        }
    }

    /// Return a reserved slot to the available set, in its original position.
    pub fn release(&self, key: DateTime<Tz>) -> bool {
        let mut state = self.lock();
        match state.position(key, SlotState::Reserved) {
            Some(idx) => {
                state.entries[idx].1 = SlotState::Available;
                debug!(slot = %state.entries[idx].0, "reservation released");
                true
            }
            None => false,
        }
    }

    /// A point-in-time copy of the available slots in ledger order.
    ///
    /// Later mutations do not affect the snapshot.
    pub fn peek_ordered(&self) -> LedgerSnapshot {
        let state = self.lock();
        LedgerSnapshot {
            slots: state
                .entries
                .iter()
                .filter(|(_, s)| *s == SlotState::Available)
                .map(|(slot, _)| *slot)
                .collect(),
            epoch: state.epoch,
        }
    }

    /// Slots currently reserved, in ledger order.
    pub fn reserved(&self) -> Vec<Slot> {
        self.lock()
            .entries
            .iter()
            .filter(|(_, s)| *s == SlotState::Reserved)
            .map(|(slot, _)| *slot)
            .collect()
    }

    /// State of the slot at `key`, or `None` once removed.
    pub fn state_of(&self, key: DateTime<Tz>) -> Option<SlotState> {
        self.lock()
            .entries
            .iter()
            .find(|(slot, _)| slot.start == key)
            .map(|(_, s)| *s)
    }

    /// Number of available slots.
    pub fn len(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|(_, s)| *s == SlotState::Available)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An immutable, restartable view of the available slots.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSnapshot {
    slots: Vec<Slot>,
    epoch: u64,
}

impl LedgerSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    pub fn first(&self) -> Option<&Slot> {
        self.slots.first()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Epoch of the ledger when the snapshot was taken.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl IntoIterator for LedgerSnapshot {
    type Item = Slot;
    type IntoIter = std::vec::IntoIter<Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<'a> IntoIterator for &'a LedgerSnapshot {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

fn dedup(slots: impl IntoIterator<Item = Slot>) -> Vec<Slot> {
    let mut seen = HashSet::new();
    slots
        .into_iter()
        .filter(|slot| seen.insert(slot.start))
        .collect()
}
