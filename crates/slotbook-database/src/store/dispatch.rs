//! Backend selection for the reservation store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use slotbook_core::config::{StoreBackend, StoreConfig};
use slotbook_core::error::AppError;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::{ReservationId, UserId, VenueId};
use slotbook_core::types::pagination::{PageRequest, PageResponse};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};
use slotbook_entity::reservation::{Reservation, ReservationStatus};

use super::{ReservationStore, SlotTransaction};
use crate::connection::DatabasePool;
use crate::memory::MemoryReservationStore;
use crate::repositories::ReservationRepository;

/// Dispatcher over the reservation store implementations.
#[derive(Debug, Clone)]
pub enum StoreDispatch {
    /// PostgreSQL (durable, multi-process safe).
    Postgres(ReservationRepository),
    /// In-process maps (single node, volatile).
    Memory(MemoryReservationStore),
}

impl StoreDispatch {
    /// Build the configured backend. The postgres backend needs a pool.
    pub fn from_config(config: &StoreConfig, pool: Option<&DatabasePool>) -> AppResult<Self> {
        match (config.backend, pool) {
            (StoreBackend::Postgres, Some(pool)) => Ok(Self::Postgres(
                ReservationRepository::new(pool.pool().clone()),
            )),
            (StoreBackend::Postgres, None) => Err(AppError::configuration(
                "store.backend = \"postgres\" requires a database pool",
            )),
            (StoreBackend::Memory, _) => Ok(Self::Memory(MemoryReservationStore::new())),
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Postgres(_) => StoreBackend::Postgres,
            Self::Memory(_) => StoreBackend::Memory,
        }
    }
}

#[async_trait]
impl ReservationStore for StoreDispatch {
    async fn find_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        match self {
            Self::Postgres(inner) => inner.find_by_id(id).await,
            Self::Memory(inner) => inner.find_by_id(id).await,
        }
    }

    async fn find_by_venue_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        match self {
            Self::Postgres(inner) => inner.find_by_venue_date(venue_id, date, statuses).await,
            Self::Memory(inner) => inner.find_by_venue_date(venue_id, date, statuses).await,
        }
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        match self {
            Self::Postgres(inner) => inner.find_by_user(user_id, page).await,
            Self::Memory(inner) => inner.find_by_user(user_id, page).await,
        }
    }

    async fn find_lapsed_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        match self {
            Self::Postgres(inner) => inner.find_lapsed_pending(now, limit).await,
            Self::Memory(inner) => inner.find_lapsed_pending(now, limit).await,
        }
    }

    async fn find_finished_confirmed(
        &self,
        local_now: NaiveDateTime,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        match self {
            Self::Postgres(inner) => inner.find_finished_confirmed(local_now, limit).await,
            Self::Memory(inner) => inner.find_finished_confirmed(local_now, limit).await,
        }
    }

    async fn save(&self, updated: &Reservation, expected_version: i32) -> AppResult<bool> {
        match self {
            Self::Postgres(inner) => inner.save(updated, expected_version).await,
            Self::Memory(inner) => inner.save(updated, expected_version).await,
        }
    }

    async fn begin_slot(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Box<dyn SlotTransaction>> {
        match self {
            Self::Postgres(inner) => inner.begin_slot(venue_id, date).await,
            Self::Memory(inner) => inner.begin_slot(venue_id, date).await,
        }
    }

    async fn blocked_overrides(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        match self {
            Self::Postgres(inner) => inner.blocked_overrides(venue_id, date).await,
            Self::Memory(inner) => inner.blocked_overrides(venue_id, date).await,
        }
    }

    async fn upsert_override(
        &self,
        input: UpsertOverride,
        now: DateTime<Utc>,
    ) -> AppResult<AvailabilityOverride> {
        match self {
            Self::Postgres(inner) => inner.upsert_override(input, now).await,
            Self::Memory(inner) => inner.upsert_override(input, now).await,
        }
    }

    async fn purge_stale_unreserved(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        match self {
            Self::Postgres(inner) => inner.purge_stale_unreserved(cutoff).await,
            Self::Memory(inner) => inner.purge_stale_unreserved(cutoff).await,
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self {
            Self::Postgres(inner) => inner.health_check().await,
            Self::Memory(inner) => inner.health_check().await,
        }
    }
}
