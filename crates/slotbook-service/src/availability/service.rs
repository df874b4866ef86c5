//! Availability queries and staff overrides.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use slotbook_core::result::AppResult;
use slotbook_core::traits::Clock;
use slotbook_core::types::id::{ReservationId, VenueId};
use slotbook_database::store::{OCCUPYING_STATUSES, ReservationStore};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};
use slotbook_entity::reservation::{ReservationStatus, TimeSlot};

use super::detector::ConflictDetector;
use crate::context::RequestContext;
use crate::venue::VenueDirectory;

/// An occupied interval, without the owner's details.
#[derive(Debug, Clone, Serialize)]
pub struct OccupiedSlot {
    pub reservation_id: ReservationId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ReservationStatus,
}

/// What a venue looks like on one date.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityView {
    pub venue_id: VenueId,
    pub date: NaiveDate,
    /// Active reservations only.
    pub reservations: Vec<OccupiedSlot>,
    /// Blocked overrides.
    pub blocked: Vec<AvailabilityOverride>,
    /// Free cells of the venue's slot grid; empty for venues the directory
    /// does not know.
    pub open_slots: Vec<TimeSlot>,
}

/// Staff request to block or unblock an interval.
#[derive(Debug, Clone, Deserialize)]
pub struct OverrideRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_blocked: bool,
    pub reason: Option<String>,
}

/// Read-side view of slot occupancy plus override management.
#[derive(Debug, Clone)]
pub struct AvailabilityService {
    store: Arc<dyn ReservationStore>,
    venues: Arc<dyn VenueDirectory>,
    clock: Arc<dyn Clock>,
    detector: ConflictDetector,
}

impl AvailabilityService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        venues: Arc<dyn VenueDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            venues,
            clock,
            detector: ConflictDetector::new(),
        }
    }

    /// Active reservations, blocked overrides and free grid slots.
    ///
    /// Reads without the venue-date lock; a slot shown as open can still be
    /// taken before the caller books it.
    pub async fn availability(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<AvailabilityView> {
        let now = self.clock.now();
        let reservations = self
            .store
            .find_by_venue_date(venue_id, date, &OCCUPYING_STATUSES)
            .await?;
        let blocked = self.store.blocked_overrides(venue_id, date).await?;

        let open_slots = match self.venues.find(venue_id).await? {
            Some(venue) => venue
                .slot_grid()
                .into_iter()
                .filter(|slot| {
                    self.detector
                        .evaluate(slot, None, &reservations, &blocked, now)
                        .is_available()
                })
                .collect(),
            None => Vec::new(),
        };

        let reservations = reservations
            .into_iter()
            .filter(|r| r.is_active(now))
            .map(|r| OccupiedSlot {
                reservation_id: r.id,
                start_time: r.start_time,
                end_time: r.end_time,
                status: r.status,
            })
            .collect();

        Ok(AvailabilityView {
            venue_id,
            date,
            reservations,
            blocked,
            open_slots,
        })
    }

    /// Block or unblock an interval. Staff and admins only.
    pub async fn set_override(
        &self,
        ctx: &RequestContext,
        venue_id: VenueId,
        req: OverrideRequest,
    ) -> AppResult<AvailabilityOverride> {
        ctx.ensure_elevated()?;
        let slot = TimeSlot::new(req.start_time, req.end_time)?;

        let saved = self
            .store
            .upsert_override(
                UpsertOverride {
                    venue_id,
                    override_date: req.date,
                    slot,
                    is_blocked: req.is_blocked,
                    reason: req.reason,
                    created_by: Some(ctx.user_id),
                },
                self.clock.now(),
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            venue_id = %venue_id,
            date = %saved.override_date,
            start = %saved.start_time,
            end = %saved.end_time,
            blocked = saved.is_blocked,
            "Availability override saved"
        );
        Ok(saved)
    }
}
