//! Peak-hour pricing table.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Pricing table consulted when a booking request carries no explicit amount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Time-of-day ranges charged at their own hourly rate.
    #[serde(default)]
    pub peak_windows: Vec<PeakWindowConfig>,
}

/// One `[start, end)` time-of-day range with its hourly rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakWindowConfig {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub hourly_rate: Decimal,
}

impl PricingConfig {
    /// Windows must be well-formed and must not overlap each other.
    pub fn validate(&self) -> Result<(), AppError> {
        for window in &self.peak_windows {
            if window.end <= window.start {
                return Err(AppError::configuration(format!(
                    "peak window {}-{} ends before it starts",
                    window.start, window.end
                )));
            }
            if window.hourly_rate < Decimal::ZERO {
                return Err(AppError::configuration("peak window rate is negative"));
            }
        }
        for (i, a) in self.peak_windows.iter().enumerate() {
            for b in self.peak_windows.iter().skip(i + 1) {
                if a.start < b.end && a.end > b.start {
                    return Err(AppError::configuration(format!(
                        "peak windows {}-{} and {}-{} overlap",
                        a.start, a.end, b.start, b.end
                    )));
                }
            }
        }
        Ok(())
    }
}
