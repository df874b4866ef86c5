//! Stale-row purge.

use std::sync::Arc;

use chrono::Duration;
use tracing;

use slotbook_core::result::AppResult;
use slotbook_core::traits::Clock;
use slotbook_database::store::ReservationStore;

/// Deletes pending rows that only ever carried a confirmation code and
/// never received a hold deadline, once the code is older than the
/// retention period.
#[derive(Debug, Clone)]
pub struct StalePurgeJob {
    store: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl StalePurgeJob {
    pub fn new(store: Arc<dyn ReservationStore>, clock: Arc<dyn Clock>, retention_hours: i64) -> Self {
        Self {
            store,
            clock,
            retention: Duration::hours(retention_hours.max(1)),
        }
    }

    pub async fn run(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.retention;
        let removed = self.store.purge_stale_unreserved(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, cutoff = %cutoff, "Purged stale unreserved rows");
        } else {
            tracing::debug!("No stale unreserved rows");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use slotbook_core::traits::ManualClock;
    use slotbook_core::types::id::{ReservationId, UserId, VenueId};
    use slotbook_database::MemoryReservationStore;
    use slotbook_entity::reservation::{ConfirmationPolicy, NewReservation, TimeSlot};

    #[tokio::test]
    async fn test_purges_only_old_rows_without_hold_deadline() {
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        let store = MemoryReservationStore::new();
        let clock = Arc::new(ManualClock::new(now));

        let mut stale = NewReservation {
            id: ReservationId::new(),
            venue_id: VenueId::new(),
            user_id: UserId::new(),
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            slot: TimeSlot::new(
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            )
            .unwrap(),
            player_count: None,
            confirmation_policy: ConfirmationPolicy::CodeGated,
            reservation_expires_at: now,
            otp_code: Some("123456".into()),
            otp_expires_at: Some(now - Duration::hours(30)),
            amount: Decimal::from(1000),
            currency: "USD".into(),
        }
        .into_reservation(now - Duration::hours(30));
        stale.reservation_expires_at = None;

        let mut recent = stale.clone();
        recent.id = ReservationId::new();
        recent.otp_expires_at = Some(now - Duration::hours(1));

        let mut held = stale.clone();
        held.id = ReservationId::new();
        held.reservation_expires_at = Some(now - Duration::hours(30));

        for r in [stale.clone(), recent.clone(), held.clone()] {
            store.seed(r);
        }

        let job = StalePurgeJob::new(Arc::new(store.clone()), clock, 24);
        assert_eq!(job.run().await.unwrap(), 1);

        let left: Vec<_> = store.all().into_iter().map(|r| r.id).collect();
        assert!(!left.contains(&stale.id));
        assert!(left.contains(&recent.id));
        assert!(left.contains(&held.id));
    }
}
