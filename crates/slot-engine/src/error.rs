//! Error types for slot-engine operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The calendar source could not supply busy intervals. Fatal for the cycle.
    #[error("Calendar source unavailable: {0}")]
    SourceUnavailable(String),

    /// Reading or writing the persisted ledger failed.
    #[error("Store I/O error on {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted ledger exists but could not be parsed.
    /// Includes the 1-based line number where the error was detected.
    #[error("Store format error at line {line}: {message}")]
    StoreFormat { line: usize, message: String },

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid slot duration: {0} minutes")]
    InvalidSlotDuration(i64),

    /// The slot consumer failed while attempting an external booking.
    #[error("Booking failed: {0}")]
    Booking(String),
}

impl EngineError {
    /// True for failures that come from I/O collaborators and may succeed on retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::SourceUnavailable(_)
                | EngineError::StoreIo { .. }
                | EngineError::Booking(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
