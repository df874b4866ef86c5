//! In-memory reservation store for single-node deployments and tests.
//!
//! Records live in a [`DashMap`]; each `(venue, date)` pair has its own
//! `tokio::sync::Mutex`, held by a [`MemorySlotTransaction`] for its whole
//! lifetime. State is lost on restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use slotbook_core::error::AppError;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::{OverrideId, ReservationId, UserId, VenueId};
use slotbook_core::types::pagination::{PageRequest, PageResponse};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};
use slotbook_entity::reservation::{NewReservation, Reservation, ReservationStatus};

use crate::store::{OCCUPYING_STATUSES, ReservationStore, SlotTransaction};

type OverrideKey = (VenueId, NaiveDate, NaiveTime, NaiveTime);

#[derive(Debug, Default)]
struct Inner {
    reservations: DashMap<ReservationId, Reservation>,
    overrides: DashMap<OverrideKey, AvailabilityOverride>,
    slot_locks: DashMap<(VenueId, NaiveDate), Arc<Mutex<()>>>,
    writes: AtomicU64,
}

impl Inner {
    /// Compare-and-set one record. Holds the map shard lock for the check
    /// and the write.
    fn apply_if_version(&self, updated: &Reservation, expected_version: i32) -> bool {
        match self.reservations.get_mut(&updated.id) {
            Some(mut current) if current.version == expected_version => {
                *current = updated.clone();
                self.writes.fetch_add(1, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    fn on_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> Vec<Reservation> {
        let mut found: Vec<Reservation> = self
            .reservations
            .iter()
            .filter(|r| {
                r.venue_id == venue_id && r.booking_date == date && statuses.contains(&r.status)
            })
            .map(|r| r.value().clone())
            .collect();
        found.sort_by_key(|r| r.start_time);
        found
    }

    fn blocked_on(&self, venue_id: VenueId, date: NaiveDate) -> Vec<AvailabilityOverride> {
        let mut found: Vec<AvailabilityOverride> = self
            .overrides
            .iter()
            .filter(|o| o.venue_id == venue_id && o.override_date == date && o.is_blocked)
            .map(|o| o.value().clone())
            .collect();
        found.sort_by_key(|o| o.start_time);
        found
    }
}

/// Process-local [`ReservationStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryReservationStore {
    inner: Arc<Inner>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of record writes applied so far (inserts and updates).
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Insert a record as-is, bypassing the lifecycle. For seeding fixtures.
    pub fn seed(&self, reservation: Reservation) {
        self.inner.reservations.insert(reservation.id, reservation);
    }

    /// Every stored record, in no particular order.
    pub fn all(&self) -> Vec<Reservation> {
        self.inner
            .reservations
            .iter()
            .map(|r| r.value().clone())
            .collect()
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn find_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.inner.reservations.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_venue_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        Ok(self.inner.on_date(venue_id, date, statuses))
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let mut owned: Vec<Reservation> = self
            .inner
            .reservations
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = owned.len() as u64;
        let items = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn find_lapsed_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        let mut lapsed: Vec<Reservation> = self
            .inner
            .reservations
            .iter()
            .filter(|r| r.is_lapsed(now))
            .map(|r| r.value().clone())
            .collect();
        lapsed.sort_by_key(|r| r.reservation_expires_at);
        lapsed.truncate(limit.max(0) as usize);
        Ok(lapsed)
    }

    async fn find_finished_confirmed(
        &self,
        local_now: NaiveDateTime,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        let mut finished: Vec<Reservation> = self
            .inner
            .reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Confirmed && r.has_finished(local_now))
            .map(|r| r.value().clone())
            .collect();
        finished.sort_by_key(|r| r.ends_at_local());
        finished.truncate(limit.max(0) as usize);
        Ok(finished)
    }

    async fn save(&self, updated: &Reservation, expected_version: i32) -> AppResult<bool> {
        Ok(self.inner.apply_if_version(updated, expected_version))
    }

    async fn begin_slot(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Box<dyn SlotTransaction>> {
        let lock = self
            .inner
            .slot_locks
            .entry((venue_id, date))
            .or_default()
            .clone();
        let guard = lock.lock_owned().await;

        Ok(Box::new(MemorySlotTransaction {
            inner: Arc::clone(&self.inner),
            venue_id,
            date,
            staged: Vec::new(),
            _guard: guard,
        }))
    }

    async fn blocked_overrides(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        Ok(self.inner.blocked_on(venue_id, date))
    }

    async fn upsert_override(
        &self,
        input: UpsertOverride,
        now: DateTime<Utc>,
    ) -> AppResult<AvailabilityOverride> {
        let key = (
            input.venue_id,
            input.override_date,
            input.slot.start(),
            input.slot.end(),
        );
        let mut entry = self
            .inner
            .overrides
            .entry(key)
            .or_insert_with(|| AvailabilityOverride {
                id: OverrideId::new(),
                venue_id: input.venue_id,
                override_date: input.override_date,
                start_time: input.slot.start(),
                end_time: input.slot.end(),
                is_blocked: input.is_blocked,
                reason: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            });
        entry.is_blocked = input.is_blocked;
        entry.reason = input.reason;
        entry.created_by = input.created_by;
        entry.updated_at = now;
        Ok(entry.value().clone())
    }

    async fn purge_stale_unreserved(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let before = self.inner.reservations.len();
        self.inner.reservations.retain(|_, r| {
            !(r.status == ReservationStatus::Pending
                && r.reservation_expires_at.is_none()
                && r.otp_expires_at.is_some_and(|at| at < cutoff))
        });
        Ok((before - self.inner.reservations.len()) as u64)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[derive(Debug)]
enum Staged {
    Insert(Reservation),
    Update {
        record: Reservation,
        expected_version: i32,
    },
}

impl Staged {
    fn record(&self) -> &Reservation {
        match self {
            Self::Insert(record) | Self::Update { record, .. } => record,
        }
    }
}

/// Buffers writes until commit while holding the venue-date mutex.
struct MemorySlotTransaction {
    inner: Arc<Inner>,
    venue_id: VenueId,
    date: NaiveDate,
    staged: Vec<Staged>,
    _guard: OwnedMutexGuard<()>,
}

impl MemorySlotTransaction {
    /// Latest view of a record: staged write first, then the map.
    fn current(&self, id: ReservationId) -> Option<Reservation> {
        self.staged
            .iter()
            .rev()
            .map(Staged::record)
            .find(|r| r.id == id)
            .cloned()
            .or_else(|| self.inner.reservations.get(&id).map(|r| r.value().clone()))
    }
}

#[async_trait]
impl SlotTransaction for MemorySlotTransaction {
    async fn occupying_reservations(&mut self) -> AppResult<Vec<Reservation>> {
        let mut found = self.inner.on_date(self.venue_id, self.date, &OCCUPYING_STATUSES);
        for staged in &self.staged {
            let record = staged.record();
            found.retain(|r| r.id != record.id);
            if OCCUPYING_STATUSES.contains(&record.status) {
                found.push(record.clone());
            }
        }
        found.sort_by_key(|r| r.start_time);
        Ok(found)
    }

    async fn blocked_overrides(&mut self) -> AppResult<Vec<AvailabilityOverride>> {
        Ok(self.inner.blocked_on(self.venue_id, self.date))
    }

    async fn find(&mut self, id: ReservationId) -> AppResult<Option<Reservation>> {
        Ok(self.current(id))
    }

    async fn insert(&mut self, new: NewReservation, now: DateTime<Utc>) -> AppResult<Reservation> {
        if new.venue_id != self.venue_id || new.booking_date != self.date {
            return Err(AppError::internal(
                "Reservation does not belong to the locked venue date",
            ));
        }
        if self.current(new.id).is_some() {
            return Err(AppError::conflict(format!(
                "Reservation {} already exists",
                new.id
            )));
        }
        let record = new.into_reservation(now);
        self.staged.push(Staged::Insert(record.clone()));
        Ok(record)
    }

    async fn save(&mut self, updated: &Reservation, expected_version: i32) -> AppResult<bool> {
        match self.current(updated.id) {
            Some(current) if current.version == expected_version => {
                self.staged.push(Staged::Update {
                    record: updated.clone(),
                    expected_version,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        for staged in self.staged {
            match staged {
                Staged::Insert(record) => {
                    self.inner.reservations.insert(record.id, record);
                    self.inner.writes.fetch_add(1, Ordering::Relaxed);
                }
                Staged::Update {
                    record,
                    expected_version,
                } => {
                    // An update staged on top of this transaction's own insert
                    // already sees the inserted version.
                    if !self.inner.apply_if_version(&record, expected_version) {
                        return Err(AppError::conflict(format!(
                            "Reservation {} changed during the transaction",
                            record.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use slotbook_entity::reservation::{ConfirmationPolicy, TimeSlot};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn new_reservation(venue_id: VenueId, start: u32, end: u32, now: DateTime<Utc>) -> NewReservation {
        NewReservation {
            id: ReservationId::new(),
            venue_id,
            user_id: UserId::new(),
            booking_date: date(),
            slot: TimeSlot::new(
                NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
            )
            .unwrap(),
            player_count: None,
            confirmation_policy: ConfirmationPolicy::Direct,
            reservation_expires_at: now + Duration::minutes(15),
            otp_code: None,
            otp_expires_at: None,
            amount: Decimal::from(100),
            currency: "USD".into(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_insert_is_discarded() {
        let store = MemoryReservationStore::new();
        let venue = VenueId::new();
        let now = Utc::now();

        let mut tx = store.begin_slot(venue, date()).await.unwrap();
        let created = tx.insert(new_reservation(venue, 10, 11, now), now).await.unwrap();
        assert_eq!(tx.occupying_reservations().await.unwrap().len(), 1);
        drop(tx);

        assert!(store.find_by_id(created.id).await.unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_commit_makes_insert_visible() {
        let store = MemoryReservationStore::new();
        let venue = VenueId::new();
        let now = Utc::now();

        let mut tx = store.begin_slot(venue, date()).await.unwrap();
        let created = tx.insert(new_reservation(venue, 10, 11, now), now).await.unwrap();
        tx.commit().await.unwrap();

        let found = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReservationStatus::Pending);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_stale_version() {
        let store = MemoryReservationStore::new();
        let now = Utc::now();
        let record = new_reservation(VenueId::new(), 10, 11, now).into_reservation(now);
        store.seed(record.clone());

        let mut first = record.clone();
        first.status = ReservationStatus::Expired;
        first.touch(now);
        assert!(store.save(&first, record.version).await.unwrap());

        let mut second = record.clone();
        second.status = ReservationStatus::Confirmed;
        second.touch(now);
        assert!(!store.save(&second, record.version).await.unwrap());

        let stored = store.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Expired);
    }

    #[tokio::test]
    async fn test_slot_lock_serializes_same_venue_date() {
        let store = MemoryReservationStore::new();
        let venue = VenueId::new();

        let held = store.begin_slot(venue, date()).await.unwrap();
        let contender = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.begin_slot(venue, date()),
        )
        .await;
        assert!(contender.is_err(), "second lock must wait");

        let other_day = store
            .begin_slot(venue, date().succ_opt().unwrap())
            .await;
        assert!(other_day.is_ok());

        drop(held);
        assert!(store.begin_slot(venue, date()).await.is_ok());
    }

    #[tokio::test]
    async fn test_lapsed_and_finished_queries() {
        let store = MemoryReservationStore::new();
        let now = Utc::now();
        let venue = VenueId::new();

        let lapsed = new_reservation(venue, 8, 9, now - Duration::hours(1)).into_reservation(now);
        let fresh = new_reservation(venue, 9, 10, now).into_reservation(now);
        let mut finished = new_reservation(venue, 10, 11, now).into_reservation(now);
        finished.status = ReservationStatus::Confirmed;
        finished.reservation_expires_at = None;
        for r in [lapsed.clone(), fresh, finished.clone()] {
            store.seed(r);
        }

        let found = store.find_lapsed_pending(now, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, lapsed.id);

        let local_now = date().and_hms_opt(12, 0, 0).unwrap();
        let done = store.find_finished_confirmed(local_now, 10).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, finished.id);
    }

    #[tokio::test]
    async fn test_purge_only_removes_unreserved_rows() {
        let store = MemoryReservationStore::new();
        let now = Utc::now();
        let venue = VenueId::new();

        let mut orphan = new_reservation(venue, 8, 9, now).into_reservation(now);
        orphan.reservation_expires_at = None;
        orphan.otp_expires_at = Some(now - Duration::days(3));
        let mut held = new_reservation(venue, 9, 10, now).into_reservation(now);
        held.otp_expires_at = Some(now - Duration::days(3));
        store.seed(orphan.clone());
        store.seed(held.clone());

        let removed = store
            .purge_stale_unreserved(now - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_by_id(orphan.id).await.unwrap().is_none());
        assert!(store.find_by_id(held.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_override_upsert_replaces_existing() {
        let store = MemoryReservationStore::new();
        let venue = VenueId::new();
        let now = Utc::now();
        let slot = TimeSlot::new(
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
        )
        .unwrap();
        let input = |blocked| UpsertOverride {
            venue_id: venue,
            override_date: date(),
            slot,
            is_blocked: blocked,
            reason: Some("maintenance".into()),
            created_by: None,
        };

        let first = store.upsert_override(input(true), now).await.unwrap();
        assert_eq!(store.blocked_overrides(venue, date()).await.unwrap().len(), 1);

        let second = store.upsert_override(input(false), now).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(store.blocked_overrides(venue, date()).await.unwrap().is_empty());
    }
}
