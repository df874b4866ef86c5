//! Reservation repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::debug;

use slotbook_core::error::{AppError, ErrorKind};
use slotbook_core::result::AppResult;
use slotbook_core::types::id::{ReservationId, UserId, VenueId};
use slotbook_core::types::pagination::{PageRequest, PageResponse};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};
use slotbook_entity::reservation::{NewReservation, Reservation, ReservationStatus};

use super::availability;
use crate::store::{OCCUPYING_STATUSES, ReservationStore, SlotTransaction};

/// PostgreSQL-backed reservation store.
#[derive(Debug, Clone)]
pub struct ReservationRepository {
    pool: PgPool,
}

impl ReservationRepository {
    /// Create a new reservation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_names(statuses: &[ReservationStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

async fn find_one<'e, E: PgExecutor<'e>>(
    exec: E,
    id: ReservationId,
) -> AppResult<Option<Reservation>> {
    sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find reservation", e))
}

async fn find_on_date<'e, E: PgExecutor<'e>>(
    exec: E,
    venue_id: VenueId,
    date: NaiveDate,
    statuses: &[ReservationStatus],
) -> AppResult<Vec<Reservation>> {
    sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations \
         WHERE venue_id = $1 AND booking_date = $2 AND status::text = ANY($3) \
         ORDER BY start_time",
    )
    .bind(venue_id)
    .bind(date)
    .bind(status_names(statuses))
    .fetch_all(exec)
    .await
    .map_err(|e| {
        AppError::with_source(
            ErrorKind::Database,
            "Failed to list reservations for venue date",
            e,
        )
    })
}

async fn insert_one<'e, E: PgExecutor<'e>>(
    exec: E,
    new: NewReservation,
    now: DateTime<Utc>,
) -> AppResult<Reservation> {
    let row = new.into_reservation(now);
    sqlx::query_as::<_, Reservation>(
        "INSERT INTO reservations (id, venue_id, user_id, booking_date, start_time, end_time, \
         duration_minutes, player_count, status, confirmation_policy, reservation_expires_at, \
         otp_code, otp_expires_at, confirmation_verified, payment_status, amount, currency, \
         version, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, \
         $18, $19, $20) RETURNING *",
    )
    .bind(row.id)
    .bind(row.venue_id)
    .bind(row.user_id)
    .bind(row.booking_date)
    .bind(row.start_time)
    .bind(row.end_time)
    .bind(row.duration_minutes)
    .bind(row.player_count)
    .bind(row.status)
    .bind(row.confirmation_policy)
    .bind(row.reservation_expires_at)
    .bind(&row.otp_code)
    .bind(row.otp_expires_at)
    .bind(row.confirmation_verified)
    .bind(row.payment_status)
    .bind(row.amount)
    .bind(&row.currency)
    .bind(row.version)
    .bind(row.created_at)
    .bind(row.updated_at)
    .fetch_one(exec)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert reservation", e))
}

async fn update_if_version<'e, E: PgExecutor<'e>>(
    exec: E,
    r: &Reservation,
    expected_version: i32,
) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE reservations SET status = $3, reservation_expires_at = $4, otp_code = $5, \
         otp_expires_at = $6, confirmation_verified = $7, payment_status = $8, \
         payment_reference = $9, cancelled_by = $10, cancelled_at = $11, \
         cancellation_reason = $12, refund_amount = $13, version = $14, updated_at = $15 \
         WHERE id = $1 AND version = $2",
    )
    .bind(r.id)
    .bind(expected_version)
    .bind(r.status)
    .bind(r.reservation_expires_at)
    .bind(&r.otp_code)
    .bind(r.otp_expires_at)
    .bind(r.confirmation_verified)
    .bind(r.payment_status)
    .bind(&r.payment_reference)
    .bind(r.cancelled_by)
    .bind(r.cancelled_at)
    .bind(&r.cancellation_reason)
    .bind(r.refund_amount)
    .bind(r.version)
    .bind(r.updated_at)
    .execute(exec)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update reservation", e))?;

    Ok(result.rows_affected() == 1)
}

#[async_trait]
impl ReservationStore for ReservationRepository {
    async fn find_by_id(&self, id: ReservationId) -> AppResult<Option<Reservation>> {
        find_one(&self.pool, id).await
    }

    async fn find_by_venue_date(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
        statuses: &[ReservationStatus],
    ) -> AppResult<Vec<Reservation>> {
        find_on_date(&self.pool, venue_id, date, statuses).await
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> AppResult<PageResponse<Reservation>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count reservations", e)
            })?;

        let items = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list reservations", e))?;

        Ok(PageResponse::new(items, page, total as u64))
    }

    async fn find_lapsed_pending(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations \
             WHERE status = 'pending' AND reservation_expires_at < $1 \
             ORDER BY reservation_expires_at LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find lapsed reservations", e)
        })
    }

    async fn find_finished_confirmed(
        &self,
        local_now: NaiveDateTime,
        limit: i64,
    ) -> AppResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations \
             WHERE status = 'confirmed' AND (booking_date + end_time) <= $1 \
             ORDER BY booking_date, end_time LIMIT $2",
        )
        .bind(local_now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find finished reservations", e)
        })
    }

    async fn save(&self, updated: &Reservation, expected_version: i32) -> AppResult<bool> {
        update_if_version(&self.pool, updated, expected_version).await
    }

    async fn begin_slot(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Box<dyn SlotTransaction>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Held until commit or rollback; serializes check-then-write per venue date.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!("{venue_id}:{date}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to acquire slot lock", e)
            })?;

        debug!(venue_id = %venue_id, date = %date, "Slot lock acquired");
        Ok(Box::new(PgSlotTransaction {
            tx,
            venue_id,
            date,
        }))
    }

    async fn blocked_overrides(
        &self,
        venue_id: VenueId,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilityOverride>> {
        availability::find_blocked(&self.pool, venue_id, date).await
    }

    async fn upsert_override(
        &self,
        input: UpsertOverride,
        now: DateTime<Utc>,
    ) -> AppResult<AvailabilityOverride> {
        availability::upsert(&self.pool, input, now).await
    }

    async fn purge_stale_unreserved(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM reservations \
             WHERE status = 'pending' AND reservation_expires_at IS NULL \
             AND otp_expires_at IS NOT NULL AND otp_expires_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to purge stale reservations", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}

/// A PostgreSQL transaction holding the venue-date advisory lock.
struct PgSlotTransaction {
    tx: Transaction<'static, Postgres>,
    venue_id: VenueId,
    date: NaiveDate,
}

#[async_trait]
impl SlotTransaction for PgSlotTransaction {
    async fn occupying_reservations(&mut self) -> AppResult<Vec<Reservation>> {
        find_on_date(&mut *self.tx, self.venue_id, self.date, &OCCUPYING_STATUSES).await
    }

    async fn blocked_overrides(&mut self) -> AppResult<Vec<AvailabilityOverride>> {
        availability::find_blocked(&mut *self.tx, self.venue_id, self.date).await
    }

    async fn find(&mut self, id: ReservationId) -> AppResult<Option<Reservation>> {
        find_one(&mut *self.tx, id).await
    }

    async fn insert(&mut self, new: NewReservation, now: DateTime<Utc>) -> AppResult<Reservation> {
        if new.venue_id != self.venue_id || new.booking_date != self.date {
            return Err(AppError::internal(
                "Reservation does not belong to the locked venue date",
            ));
        }
        insert_one(&mut *self.tx, new, now).await
    }

    async fn save(&mut self, updated: &Reservation, expected_version: i32) -> AppResult<bool> {
        update_if_version(&mut *self.tx, updated, expected_version).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })
    }
}
