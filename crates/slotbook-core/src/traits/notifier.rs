//! Outbound notification collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::result::AppResult;
use crate::types::id::{ReservationId, UserId};

/// Messages delivered out of band to the reservation owner.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A slot is held and awaits payment.
    HoldPlaced {
        reservation_id: ReservationId,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    },
    /// A one-time confirmation code was issued.
    CodeIssued {
        reservation_id: ReservationId,
        user_id: UserId,
        code: String,
        expires_at: DateTime<Utc>,
    },
    /// The confirmation code was accepted; payment may proceed.
    CodeVerified {
        reservation_id: ReservationId,
        user_id: UserId,
    },
    /// Payment settled and the slot is permanently held.
    BookingConfirmed {
        reservation_id: ReservationId,
        user_id: UserId,
    },
}

impl Notification {
    pub fn reservation_id(&self) -> ReservationId {
        match self {
            Self::HoldPlaced { reservation_id, .. }
            | Self::CodeIssued { reservation_id, .. }
            | Self::CodeVerified { reservation_id, .. }
            | Self::BookingConfirmed { reservation_id, .. } => *reservation_id,
        }
    }
}

/// Delivers notifications. Callers treat this as fire-and-forget: a failed
/// delivery is logged and never fails the reservation operation.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug + 'static {
    async fn notify(&self, notification: Notification) -> AppResult<()>;
}
