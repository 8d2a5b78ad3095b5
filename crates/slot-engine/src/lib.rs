//! # slot-engine
//!
//! Business-hours availability and a persisted ledger of bookable slots.
//!
//! The engine sits between "busy periods in" and "one concrete slot reserved
//! out": it takes the busy intervals of a calendar, computes the free time inside
//! a daily business-hours window, cuts that free time into hour-aligned slots of
//! fixed length, and tracks which slots remain as external bookings consume them.
//!
//! ## Modules
//!
//! - [`window`] — Half-open timezone-aware windows and the `clip` primitive
//! - [`policy`] — Business hours in a fixed IANA timezone
//! - [`freebusy`] — Busy intervals → business-hours free intervals
//! - [`quantize`] — Free intervals → hour-aligned fixed-length slots
//! - [`ledger`] — The authoritative set of still-bookable slots
//! - [`store`] — Ledger persistence (line-oriented file, in-memory)
//! - [`source`] — Calendar sources of busy intervals
//! - [`consumer`] — Slot consumers that attempt external bookings
//! - [`cycle`] — Refresh and booking pipeline
//! - [`config`] — Engine configuration
//! - [`error`] — Error types

pub mod config;
pub mod consumer;
pub mod cycle;
pub mod error;
pub mod freebusy;
pub mod ledger;
pub mod policy;
pub mod quantize;
pub mod source;
pub mod store;
pub mod window;

pub use config::EngineConfig;
pub use consumer::{BookingOutcome, OfferListConsumer, SlotConsumer};
pub use cycle::{Plan, RefreshReport, Scheduler};
pub use error::EngineError;
pub use freebusy::{compute_free, BusyInterval, FreeInterval};
pub use ledger::{LedgerSnapshot, SlotLedger, SlotState};
pub use policy::BusinessHoursPolicy;
pub use quantize::{quantize, Slot};
pub use source::{CalendarSource, JsonFileSource, StaticSource};
pub use store::{FileStore, MemoryStore, SlotStore};
pub use window::{clip, TimeWindow};
