//! Reservation engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Windows, bounds and policy knobs for the reservation lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Time-to-live of a new pending reservation, in minutes.
    #[serde(default = "default_reservation_window")]
    pub reservation_window_minutes: i64,
    /// Lifetime of a one-time confirmation code, in minutes.
    #[serde(default = "default_code_window")]
    pub code_window_minutes: i64,
    /// Number of digits in a confirmation code.
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Shortest bookable duration, in minutes.
    #[serde(default = "default_min_duration")]
    pub min_duration_minutes: i64,
    /// Longest bookable duration, in minutes.
    #[serde(default = "default_max_duration")]
    pub max_duration_minutes: i64,
    /// Largest accepted player count.
    #[serde(default = "default_max_players")]
    pub max_players: i32,
    /// Largest single extension of a pending reservation, in minutes.
    #[serde(default = "default_max_extension")]
    pub max_extension_minutes: i64,
    /// Offset of venue wall-clock time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// Currency used when a request does not name one.
    #[serde(default = "default_currency")]
    pub default_currency: String,
    /// Refund tiers applied on cancellation.
    #[serde(default)]
    pub cancellation: CancellationPolicyConfig,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reservation_window_minutes: default_reservation_window(),
            code_window_minutes: default_code_window(),
            code_length: default_code_length(),
            min_duration_minutes: default_min_duration(),
            max_duration_minutes: default_max_duration(),
            max_players: default_max_players(),
            max_extension_minutes: default_max_extension(),
            utc_offset_minutes: 0,
            default_currency: default_currency(),
            cancellation: CancellationPolicyConfig::default(),
        }
    }
}

impl BookingConfig {
    /// Check internal consistency of the configured bounds.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.reservation_window_minutes <= 0 || self.code_window_minutes <= 0 {
            return Err(AppError::configuration(
                "booking windows must be positive",
            ));
        }
        if !(4..=10).contains(&self.code_length) {
            return Err(AppError::configuration(
                "booking.code_length must be between 4 and 10",
            ));
        }
        if self.min_duration_minutes <= 0 || self.min_duration_minutes > self.max_duration_minutes
        {
            return Err(AppError::configuration(
                "booking duration bounds are inconsistent",
            ));
        }
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::configuration(
                "booking.utc_offset_minutes is out of range",
            ));
        }
        self.cancellation.validate()
    }
}

/// Time-to-booking refund tiers.
///
/// At or beyond `full_refund_hours` the whole amount is refunded; at or
/// beyond `partial_refund_hours` the `partial_refund_percent` share is;
/// closer than that nothing is, and only elevated actors may cancel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationPolicyConfig {
    #[serde(default = "default_full_refund_hours")]
    pub full_refund_hours: i64,
    #[serde(default = "default_partial_refund_hours")]
    pub partial_refund_hours: i64,
    #[serde(default = "default_partial_refund_percent")]
    pub partial_refund_percent: Decimal,
}

impl Default for CancellationPolicyConfig {
    fn default() -> Self {
        Self {
            full_refund_hours: default_full_refund_hours(),
            partial_refund_hours: default_partial_refund_hours(),
            partial_refund_percent: default_partial_refund_percent(),
        }
    }
}

impl CancellationPolicyConfig {
    fn validate(&self) -> Result<(), AppError> {
        if self.partial_refund_hours < 0 || self.partial_refund_hours > self.full_refund_hours {
            return Err(AppError::configuration(
                "cancellation refund tiers are inconsistent",
            ));
        }
        if self.partial_refund_percent < Decimal::ZERO
            || self.partial_refund_percent > Decimal::ONE_HUNDRED
        {
            return Err(AppError::configuration(
                "booking.cancellation.partial_refund_percent must be within 0..=100",
            ));
        }
        Ok(())
    }
}

fn default_reservation_window() -> i64 {
    15
}

fn default_code_window() -> i64 {
    5
}

fn default_code_length() -> usize {
    6
}

fn default_min_duration() -> i64 {
    30
}

fn default_max_duration() -> i64 {
    480
}

fn default_max_players() -> i32 {
    30
}

fn default_max_extension() -> i64 {
    30
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_full_refund_hours() -> i64 {
    24
}

fn default_partial_refund_hours() -> i64 {
    2
}

fn default_partial_refund_percent() -> Decimal {
    Decimal::from(50)
}
