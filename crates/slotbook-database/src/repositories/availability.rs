//! Availability override queries.
//!
//! Free functions over any executor so they run both on the pool and
//! inside a slot transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgExecutor;

use slotbook_core::error::{AppError, ErrorKind};
use slotbook_core::result::AppResult;
use slotbook_core::types::id::{OverrideId, VenueId};
use slotbook_entity::availability::{AvailabilityOverride, UpsertOverride};

/// Blocked overrides for one venue and date.
pub async fn find_blocked<'e, E: PgExecutor<'e>>(
    exec: E,
    venue_id: VenueId,
    date: NaiveDate,
) -> AppResult<Vec<AvailabilityOverride>> {
    sqlx::query_as::<_, AvailabilityOverride>(
        "SELECT * FROM availability_overrides \
         WHERE venue_id = $1 AND override_date = $2 AND is_blocked \
         ORDER BY start_time",
    )
    .bind(venue_id)
    .bind(date)
    .fetch_all(exec)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load overrides", e))
}

/// Insert or update the override for `(venue, date, start, end)`.
pub async fn upsert<'e, E: PgExecutor<'e>>(
    exec: E,
    input: UpsertOverride,
    now: DateTime<Utc>,
) -> AppResult<AvailabilityOverride> {
    sqlx::query_as::<_, AvailabilityOverride>(
        "INSERT INTO availability_overrides \
         (id, venue_id, override_date, start_time, end_time, is_blocked, reason, created_by, \
          created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
         ON CONFLICT (venue_id, override_date, start_time, end_time) DO UPDATE \
         SET is_blocked = EXCLUDED.is_blocked, reason = EXCLUDED.reason, \
             created_by = EXCLUDED.created_by, updated_at = EXCLUDED.updated_at \
         RETURNING *",
    )
    .bind(OverrideId::new())
    .bind(input.venue_id)
    .bind(input.override_date)
    .bind(input.slot.start())
    .bind(input.slot.end())
    .bind(input.is_blocked)
    .bind(&input.reason)
    .bind(input.created_by)
    .bind(now)
    .fetch_one(exec)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert override", e))
}
