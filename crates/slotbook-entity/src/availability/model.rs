//! Availability override entity model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use slotbook_core::types::id::{OverrideId, UserId, VenueId};
use sqlx::FromRow;

use crate::reservation::TimeSlot;

/// A staff decision about one `(venue, date, start, end)` interval.
///
/// When `is_blocked` is set the interval is unavailable regardless of
/// reservations. Overrides are not part of the reservation state machine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AvailabilityOverride {
    pub id: OverrideId,
    pub venue_id: VenueId,
    pub override_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_blocked: bool,
    pub reason: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AvailabilityOverride {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::from_stored(self.start_time, self.end_time)
    }
}

/// Insert-or-update input keyed by `(venue_id, date, slot)`.
#[derive(Debug, Clone)]
pub struct UpsertOverride {
    pub venue_id: VenueId,
    pub override_date: NaiveDate,
    pub slot: TimeSlot,
    pub is_blocked: bool,
    pub reason: Option<String>,
    pub created_by: Option<UserId>,
}
