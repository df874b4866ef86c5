//! Reservation lifecycle, payment, and confirmation policy enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a reservation.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            │
///    ├──► expired └──► cancelled
///    └──► cancelled
/// ```
///
/// `NoShow` is terminal and has no inbound edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reservation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Holding the slot until payment or expiry.
    Pending,
    /// Paid; the slot is permanently held.
    Confirmed,
    /// Cancelled by an actor or by a failed settlement.
    Cancelled,
    /// The booked interval has passed.
    Completed,
    /// The reservation window lapsed before settlement.
    Expired,
    /// The customer did not turn up.
    NoShow,
}

impl ReservationStatus {
    /// Every status, in declaration order.
    pub const ALL: [ReservationStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
        Self::Expired,
        Self::NoShow,
    ];

    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_transition_to(&self, next: ReservationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Pending, Self::Expired)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
        )
    }

    /// Check if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Completed | Self::Expired | Self::NoShow
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::NoShow => "no_show",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement state of the payment attached to a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a pending reservation becomes eligible for payment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "confirmation_policy", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Payment alone confirms the reservation.
    #[default]
    Direct,
    /// A one-time code must be submitted before checkout is allowed.
    CodeGated,
}

impl ConfirmationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::CodeGated => "code_gated",
        }
    }
}

impl fmt::Display for ConfirmationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
