//! Engine configuration.
//!
//! Every setting the pipeline needs travels in an [`EngineConfig`] value handed
//! to components at construction time. Loaded from JSON; every field has a
//! default, unknown fields are rejected.

use std::fs;
use std::path::Path;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::policy::BusinessHoursPolicy;
use crate::quantize::{self, DEFAULT_SLOT_MINUTES};

pub const DEFAULT_TIMEZONE: &str = "Europe/Amsterdam";
pub const DEFAULT_DAY_START: &str = "08:00";
pub const DEFAULT_DAY_END: &str = "22:00";
pub const DEFAULT_HORIZON_DAYS: u32 = 2;
/// Longest accepted booking horizon, in days past today.
pub const MAX_HORIZON_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// IANA timezone id all computation runs in.
    pub timezone: String,
    /// Business opening time, `HH:MM`.
    pub day_start: String,
    /// Business closing time, `HH:MM`.
    pub day_end: String,
    /// Length of one bookable slot.
    pub slot_minutes: i64,
    /// Refresh cycles look this many calendar days past today.
    pub horizon_days: u32,
    /// Free intervals shorter than this are not quantized.
    pub min_free_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            day_start: DEFAULT_DAY_START.to_string(),
            day_end: DEFAULT_DAY_END.to_string(),
            slot_minutes: DEFAULT_SLOT_MINUTES,
            horizon_days: DEFAULT_HORIZON_DAYS,
            min_free_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns `EngineError::InvalidConfig` for malformed JSON or unknown fields,
    /// plus any error [`validate`](Self::validate) reports.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `EngineError::InvalidConfig` if the file cannot be read, plus any
    /// error [`from_json_str`](Self::from_json_str) reports.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Check every field without building anything.
    pub fn validate(&self) -> Result<()> {
        self.policy()?;
        self.slot_duration()?;
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(EngineError::InvalidConfig(format!(
                "horizon_days must be at most {}, got {}",
                MAX_HORIZON_DAYS, self.horizon_days
            )));
        }
        if self.min_free_minutes < 0 {
            return Err(EngineError::InvalidConfig(format!(
                "min_free_minutes must not be negative, got {}",
                self.min_free_minutes
            )));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn policy(&self) -> Result<BusinessHoursPolicy> {
        BusinessHoursPolicy::from_names(&self.timezone, &self.day_start, &self.day_end)
    }

    pub fn slot_duration(&self) -> Result<Duration> {
        quantize::slot_duration(self.slot_minutes)
    }
}
