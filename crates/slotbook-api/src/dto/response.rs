//! Response DTOs.

use serde::{Deserialize, Serialize};

use slotbook_entity::reservation::{PaymentStatus, ReservationStatus};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Payment callback acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticeResponse {
    /// Whether this callback changed the reservation.
    pub applied: bool,
    pub status: Option<ReservationStatus>,
    pub payment_status: Option<PaymentStatus>,
}
