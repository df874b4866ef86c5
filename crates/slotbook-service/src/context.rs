//! Request context carrying the authenticated actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use slotbook_core::AppError;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::UserId;
use slotbook_entity::reservation::Reservation;
use slotbook_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built by the API layer from the verified bearer token and passed into
/// every lifecycle call so each operation knows *who* is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: UserId,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            request_time: Utc::now(),
        }
    }

    /// Whether the actor may act on reservations they do not own.
    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Owner or elevated actor; anyone else is refused.
    pub fn ensure_can_access(&self, reservation: &Reservation) -> AppResult<()> {
        if reservation.is_owned_by(&self.user_id) || self.is_elevated() {
            Ok(())
        } else {
            Err(AppError::unauthorized(
                "You do not have access to this reservation",
            ))
        }
    }

    /// Staff-only operations.
    pub fn ensure_elevated(&self) -> AppResult<()> {
        if self.is_elevated() {
            Ok(())
        } else {
            Err(AppError::unauthorized("Venue staff privileges required"))
        }
    }
}
