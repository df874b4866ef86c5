//! Expiry sweep: lapsed holds become `expired`, finished bookings become
//! `completed`.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing;

use slotbook_core::result::AppResult;
use slotbook_core::types::id::ReservationId;
use slotbook_service::ReservationService;

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Holds moved to `expired`.
    pub expired: u64,
    /// Records another writer settled first.
    pub skipped: u64,
    /// Records whose transition failed; retried on the next sweep.
    pub failed: u64,
    /// Bookings moved to `completed`.
    pub completed: u64,
}

/// One pass over lapsed holds and finished bookings.
///
/// Safe to run concurrently with itself and with request traffic: every
/// transition re-checks its precondition against the stored version.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    reservations: Arc<ReservationService>,
    batch_size: i64,
}

impl ExpirySweeper {
    pub fn new(reservations: Arc<ReservationService>, batch_size: i64) -> Self {
        Self {
            reservations,
            batch_size: batch_size.max(1),
        }
    }

    /// Run the sweep once over every lapsed hold, `batch_size` at a time.
    /// Only a failure to list lapsed holds is returned as an error;
    /// per-record failures are logged, counted, and left for the next sweep.
    pub async fn run_once(&self) -> AppResult<SweepReport> {
        let mut report = SweepReport::default();

        let mut tried: HashSet<ReservationId> = HashSet::new();
        loop {
            // Failed holds stay lapsed and sort first; over-fetch by that
            // many so they cannot fill the batch on their own.
            let limit = self.batch_size + tried.len() as i64;
            let lapsed = self.reservations.lapsed(limit).await?;
            let exhausted = (lapsed.len() as i64) < limit;

            let mut progressed = false;
            for reservation in lapsed {
                if !tried.insert(reservation.id) {
                    continue;
                }
                progressed = true;
                match self.reservations.expire(reservation.id).await {
                    Ok(true) => report.expired += 1,
                    Ok(false) => report.skipped += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            reservation_id = %reservation.id,
                            error = %e,
                            "Failed to expire reservation"
                        );
                    }
                }
            }

            if exhausted || !progressed {
                break;
            }
        }

        match self.reservations.auto_complete(self.batch_size).await {
            Ok(summary) => {
                report.completed = summary.completed;
                report.failed += summary.failed;
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(error = %e, "Auto-complete pass failed");
            }
        }

        if report != SweepReport::default() {
            tracing::info!(
                expired = report.expired,
                skipped = report.skipped,
                failed = report.failed,
                completed = report.completed,
                "Sweep finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use slotbook_core::config::BookingConfig;
    use slotbook_core::traits::ManualClock;
    use slotbook_core::types::id::{UserId, VenueId};
    use slotbook_database::MemoryReservationStore;
    use slotbook_entity::reservation::{ConfirmationPolicy, ReservationStatus};
    use slotbook_entity::user::UserRole;
    use slotbook_service::{
        CreateReservationRequest, LogNotifier, PriceSchedule, RequestContext,
        SettlementOutcome, StaticVenueDirectory,
    };

    struct Fixture {
        store: MemoryReservationStore,
        clock: Arc<ManualClock>,
        service: Arc<ReservationService>,
        venue_id: VenueId,
    }

    fn fixture() -> Fixture {
        let store = MemoryReservationStore::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ));
        let service = Arc::new(ReservationService::new(
            Arc::new(store.clone()),
            Arc::new(StaticVenueDirectory::default()),
            Arc::new(PriceSchedule::default()),
            Arc::new(LogNotifier),
            clock.clone(),
            BookingConfig::default(),
        ));
        Fixture {
            store,
            clock,
            service,
            venue_id: VenueId::new(),
        }
    }

    fn request(venue_id: VenueId, start: u32) -> CreateReservationRequest {
        CreateReservationRequest {
            venue_id,
            booking_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start + 1, 0, 0).unwrap(),
            player_count: None,
            amount: Some(Decimal::from(1000)),
            currency: None,
            confirmation_policy: ConfirmationPolicy::Direct,
        }
    }

    #[tokio::test]
    async fn test_sweep_expires_lapsed_and_completes_finished() {
        let f = fixture();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);

        let lapsing = f.service.create(&ctx, request(f.venue_id, 14)).await.unwrap();
        let early = f.service.create(&ctx, request(f.venue_id, 9)).await.unwrap();
        f.service
            .settle_payment(early.id, SettlementOutcome::Success, None)
            .await
            .unwrap();

        let sweeper = ExpirySweeper::new(f.service.clone(), 100);
        assert_eq!(sweeper.run_once().await.unwrap(), SweepReport::default());

        // 10:30 local: the hold has lapsed and the 09:00 booking is over.
        f.clock.advance(Duration::minutes(150));
        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report.expired, 1);
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 0);

        let statuses: Vec<_> = [lapsing.id, early.id]
            .iter()
            .map(|id| {
                f.store
                    .all()
                    .into_iter()
                    .find(|r| r.id == *id)
                    .unwrap()
                    .status
            })
            .collect();
        assert_eq!(
            statuses,
            vec![ReservationStatus::Expired, ReservationStatus::Completed]
        );

        // A second pass finds nothing left to do.
        assert_eq!(sweeper.run_once().await.unwrap(), SweepReport::default());
    }

    #[tokio::test]
    async fn test_sweep_never_reverts_a_confirmed_booking() {
        let f = fixture();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);
        let paid = f.service.create(&ctx, request(f.venue_id, 14)).await.unwrap();
        f.service
            .settle_payment(paid.id, SettlementOutcome::Success, None)
            .await
            .unwrap();

        f.clock.advance(Duration::minutes(30));
        let report = ExpirySweeper::new(f.service.clone(), 100)
            .run_once()
            .await
            .unwrap();
        assert_eq!(report.expired, 0);
        assert_eq!(
            f.service.find(paid.id).await.unwrap().status,
            ReservationStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_overlapping_sweeps_expire_each_hold_once() {
        let f = fixture();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);
        for start in [10, 12, 14, 16] {
            f.service.create(&ctx, request(f.venue_id, start)).await.unwrap();
        }
        f.clock.advance(Duration::minutes(20));

        let sweeper = ExpirySweeper::new(f.service.clone(), 100);
        let (a, b) = tokio::join!(sweeper.run_once(), sweeper.run_once());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.expired + b.expired, 4);
        assert_eq!(a.failed + b.failed, 0);
    }

    #[tokio::test]
    async fn test_one_sweep_drains_more_holds_than_a_batch() {
        let f = fixture();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);
        for start in [10, 12, 14, 16, 18] {
            f.service.create(&ctx, request(f.venue_id, start)).await.unwrap();
        }
        f.clock.advance(Duration::minutes(20));

        let report = ExpirySweeper::new(f.service.clone(), 2)
            .run_once()
            .await
            .unwrap();
        assert_eq!(report.expired, 5);
        assert!(
            f.store
                .all()
                .iter()
                .all(|r| r.status == ReservationStatus::Expired)
        );
    }

    #[tokio::test]
    async fn test_one_sweep_completes_more_bookings_than_a_batch() {
        let f = fixture();
        let ctx = RequestContext::new(UserId::new(), UserRole::Customer);
        for start in [9, 10, 11] {
            let booked = f.service.create(&ctx, request(f.venue_id, start)).await.unwrap();
            f.service
                .settle_payment(booked.id, SettlementOutcome::Success, None)
                .await
                .unwrap();
        }

        // 13:00 local: all three bookings are over.
        f.clock.advance(Duration::hours(5));
        let report = ExpirySweeper::new(f.service.clone(), 1)
            .run_once()
            .await
            .unwrap();
        assert_eq!(report.completed, 3);
        assert_eq!(report.failed, 0);
    }
}
