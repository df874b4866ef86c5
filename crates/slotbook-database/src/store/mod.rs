//! Reservation store contracts.
//!
//! All check-then-write sequences that can create or re-activate slot
//! occupancy run inside a [`SlotTransaction`], which holds an exclusive
//! lock on one `(venue, date)` pair for its lifetime. Single-record
//! mutations outside that lock go through [`ReservationStore::save`], an
//! optimistic compare-and-set on the record's `version`.

pub mod dispatch;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use slotbook_core::result::AppResult;
use slotbook_core::types::id::{ReservationId, UserId, VenueId};
use slotbook_core::types::pagination::{PageRequest, PageResponse};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};
use slotbook_entity::reservation::{NewReservation, Reservation, ReservationStatus};

pub use dispatch::StoreDispatch;

/// Statuses that can occupy a slot.
pub const OCCUPYING_STATUSES: [ReservationStatus; 2] =
    [ReservationStatus::Pending, ReservationStatus::Confirmed];

/// Durable access to reservation records and availability overrides.
#[async_trait]
pub trait ReservationStore: Send + Sync + std::fmt::Debug {
    /// Point lookup by id.
    async fn find_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Range scan over one venue and date, filtered by status.
    async fn find_by_venue_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>>;

    /// A user's reservations, newest first.
    async fn find_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Reservation>>;

    /// Pending records whose hold deadline is strictly before `now`, across
    /// all venues, oldest deadline first.
    async fn find_lapsed_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Reservation>>;

    /// Confirmed records whose venue-local end is at or before `local_now`.
    async fn find_finished_confirmed(
        &self,
        local_now: NaiveDateTime,
        limit: i64,
    ) -> AppResult<Vec<Reservation>>;

    /// Persist `updated` if the stored version still equals
    /// `expected_version`. Returns `false` when another writer got there
    /// first; nothing is written in that case.
    async fn save(&self, updated: &Reservation, expected_version: i32) -> AppResult<bool>;

    /// Open a transaction holding the exclusive `(venue_id, date)` lock.
    async fn begin_slot(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Box<dyn SlotTransaction>>;

    /// Blocked overrides for one venue and date.
    async fn blocked_overrides(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilityOverride>>;

    /// Insert or update the override keyed by venue, date and interval.
    async fn upsert_override(
        &self,
        input: UpsertOverride,
        now: DateTime<Utc>,
    ) -> AppResult<AvailabilityOverride>;

    /// Hard-delete pending rows that never received a hold deadline and
    /// whose confirmation code lapsed before `cutoff`. Returns rows removed.
    async fn purge_stale_unreserved(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Work performed under the exclusive lock of one `(venue, date)` pair.
///
/// Writes become visible on [`commit`](SlotTransaction::commit). Dropping
/// the transaction without committing discards them and releases the lock.
#[async_trait]
pub trait SlotTransaction: Send {
    /// Pending and confirmed records of the locked venue and date.
    async fn occupying_reservations(&mut self) -> AppResult<Vec<Reservation>>;

    /// Blocked overrides of the locked venue and date.
    async fn blocked_overrides(&mut self) -> AppResult<Vec<AvailabilityOverride>>;

    /// Point lookup, seeing this transaction's own writes.
    async fn find(&mut self, id: ReservationId) -> AppResult<Option<Reservation>>;

    /// Stage a new pending record.
    async fn insert(&mut self, new: NewReservation, now: DateTime<Utc>) -> AppResult<Reservation>;

    /// Stage a compare-and-set update; same contract as [`ReservationStore::save`].
    async fn save(&mut self, updated: &Reservation, expected_version: i32) -> AppResult<bool>;

    /// Make staged writes durable and release the lock.
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
