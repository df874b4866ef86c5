//! Conflict detection over reservations and staff overrides.

use chrono::{DateTime, Utc};
use serde::Serialize;

use slotbook_core::result::AppResult;
use slotbook_core::types::id::ReservationId;
use slotbook_database::store::SlotTransaction;
use slotbook_entity::availability::AvailabilityOverride;
use slotbook_entity::reservation::{Reservation, TimeSlot};

/// Why an interval is or is not available.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConflictReport {
    /// Active reservations overlapping the interval.
    pub conflicts: Vec<Reservation>,
    /// Blocked overrides overlapping the interval.
    pub blocked: Vec<AvailabilityOverride>,
}

impl ConflictReport {
    pub fn is_available(&self) -> bool {
        self.conflicts.is_empty() && self.blocked.is_empty()
    }

    pub fn conflicting_ids(&self) -> Vec<ReservationId> {
        self.conflicts.iter().map(|r| r.id).collect()
    }
}

/// Decides whether a slot is free.
///
/// A reservation blocks only while active: confirmed, or pending with a
/// hold deadline strictly after `now`. A pending record whose deadline
/// has passed never blocks, whether or not the sweeper has expired it yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Pure evaluation against already-loaded records.
    pub fn evaluate(
        &self,
        slot: &TimeSlot,
        exclude_id: Option<ReservationId>,
        reservations: &[Reservation],
        overrides: &[AvailabilityOverride],
        now: DateTime<Utc>,
    ) -> ConflictReport {
        let conflicts = reservations
            .iter()
            .filter(|r| Some(r.id) != exclude_id)
            .filter(|r| r.is_active(now))
            .filter(|r| r.slot().overlaps(slot))
            .cloned()
            .collect();

        let blocked = overrides
            .iter()
            .filter(|o| o.is_blocked && o.slot().overlaps(slot))
            .cloned()
            .collect();

        ConflictReport { conflicts, blocked }
    }

    /// Check inside a slot transaction; the answer stays valid until commit.
    pub async fn check_locked(
        &self,
        tx: &mut dyn SlotTransaction,
        slot: &TimeSlot,
        exclude_id: Option<ReservationId>,
        now: DateTime<Utc>,
    ) -> AppResult<ConflictReport> {
        let reservations = tx.occupying_reservations().await?;
        let overrides = tx.blocked_overrides().await?;
        Ok(self.evaluate(slot, exclude_id, &reservations, &overrides, now))
    }
}
