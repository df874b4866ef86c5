//! Request DTOs with validation.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use slotbook_core::error::AppError;
use slotbook_core::types::id::VenueId;
use slotbook_entity::reservation::ConfirmationPolicy;
use slotbook_service::CreateReservationRequest;
use slotbook_service::availability::OverrideRequest;

/// Run field validation, turning failures into a validation error.
pub fn validate<T: Validate>(req: &T) -> Result<(), AppError> {
    req.validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))
}

/// Create reservation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReservationBody {
    pub venue_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(range(min = 1, message = "At least one player is required"))]
    pub player_count: Option<i32>,
    /// Explicit price; quoted from the venue's price table when absent.
    pub amount: Option<Decimal>,
    #[validate(length(equal = 3, message = "Currency must be a three-letter code"))]
    pub currency: Option<String>,
    #[serde(default)]
    pub confirmation_policy: ConfirmationPolicy,
}

impl From<CreateReservationBody> for CreateReservationRequest {
    fn from(body: CreateReservationBody) -> Self {
        Self {
            venue_id: VenueId::from_uuid(body.venue_id),
            booking_date: body.booking_date,
            start_time: body.start_time,
            end_time: body.end_time,
            player_count: body.player_count,
            amount: body.amount,
            currency: body.currency,
            confirmation_policy: body.confirmation_policy,
        }
    }
}

/// Confirmation code submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmCodeBody {
    #[validate(length(min = 1, max = 16, message = "Code is required"))]
    pub code: String,
}

/// Hold extension.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtendBody {
    #[validate(range(min = 1, message = "Extension must be positive"))]
    pub minutes: i64,
}

/// Cancellation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CancelBody {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// `?date=` for availability queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

/// Staff block/unblock of an interval.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OverrideBody {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_blocked")]
    pub is_blocked: bool,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

fn default_blocked() -> bool {
    true
}

impl From<OverrideBody> for OverrideRequest {
    fn from(body: OverrideBody) -> Self {
        Self {
            date: body.date,
            start_time: body.start_time,
            end_time: body.end_time,
            is_blocked: body.is_blocked,
            reason: body.reason,
        }
    }
}
