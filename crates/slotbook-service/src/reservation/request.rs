//! Inputs and outputs of lifecycle operations.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use slotbook_core::types::id::VenueId;
use slotbook_entity::reservation::{ConfirmationPolicy, PaymentStatus, Reservation};

/// A booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub venue_id: VenueId,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub player_count: Option<i32>,
    /// Explicit price. When absent the venue's price table is used.
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub confirmation_policy: ConfirmationPolicy,
}

/// Terminal outcome reported by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Success,
    Failure,
    Cancelled,
    Chargedback,
}

impl SettlementOutcome {
    /// Payment status recorded for this outcome.
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            Self::Success => PaymentStatus::Paid,
            Self::Failure | Self::Cancelled => PaymentStatus::Failed,
            Self::Chargedback => PaymentStatus::Refunded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::Chargedback => "chargedback",
        }
    }
}

/// Result of a settlement attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementResult {
    pub reservation: Reservation,
    /// `false` when the record was already settled and nothing was written.
    pub applied: bool,
}
