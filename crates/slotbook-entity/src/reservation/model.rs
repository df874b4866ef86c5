//! Reservation entity model.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slotbook_core::types::id::{ReservationId, UserId, VenueId};
use sqlx::FromRow;

use super::slot::TimeSlot;
use super::status::{ConfirmationPolicy, PaymentStatus, ReservationStatus};

/// A booking of one slot at one venue.
///
/// Two independent timers live on the record: `reservation_expires_at`
/// bounds how long a pending booking holds its slot, and `otp_expires_at`
/// bounds the one-time confirmation code. Neither is ever derived from the
/// other.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: ReservationId,
    pub venue_id: VenueId,
    /// Exclusive owner.
    pub user_id: UserId,
    /// Venue-local calendar date.
    pub booking_date: NaiveDate,
    /// Venue-local start, inclusive.
    pub start_time: NaiveTime,
    /// Venue-local end, exclusive.
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
    pub player_count: Option<i32>,
    pub status: ReservationStatus,
    pub confirmation_policy: ConfirmationPolicy,
    /// Hold deadline of a pending booking. Cleared on confirmation.
    pub reservation_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing, default)]
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Set once the confirmation code has been accepted.
    pub confirmation_verified: bool,
    pub payment_status: PaymentStatus,
    pub amount: Decimal,
    pub currency: String,
    /// Gateway transaction id from the settlement callback.
    pub payment_reference: Option<String>,
    pub cancelled_by: Option<UserId>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub refund_amount: Option<Decimal>,
    /// Optimistic concurrency token, bumped on every write.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// The booked interval.
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::from_stored(self.start_time, self.end_time)
    }

    /// Whether this record currently occupies its slot.
    ///
    /// A pending record only counts while its hold deadline is strictly in
    /// the future.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ReservationStatus::Confirmed => true,
            ReservationStatus::Pending => self.reservation_expires_at.is_some_and(|at| at > now),
            _ => false,
        }
    }

    /// Whether this is a pending record whose hold deadline has passed.
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Pending
            && self.reservation_expires_at.is_some_and(|at| at < now)
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    /// Venue-local start as a timestamp without zone.
    pub fn starts_at_local(&self) -> NaiveDateTime {
        self.booking_date.and_time(self.start_time)
    }

    /// Venue-local end as a timestamp without zone.
    pub fn ends_at_local(&self) -> NaiveDateTime {
        self.booking_date.and_time(self.end_time)
    }

    /// Whether a confirmed booking's interval is over.
    pub fn has_finished(&self, local_now: NaiveDateTime) -> bool {
        self.ends_at_local() <= local_now
    }

    /// Record a write: bump the version and touch `updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

/// Data required to insert a new pending reservation.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub id: ReservationId,
    pub venue_id: VenueId,
    pub user_id: UserId,
    pub booking_date: NaiveDate,
    pub slot: TimeSlot,
    pub player_count: Option<i32>,
    pub confirmation_policy: ConfirmationPolicy,
    pub reservation_expires_at: DateTime<Utc>,
    pub otp_code: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub currency: String,
}

impl NewReservation {
    /// Materialize the row as it looks right after insertion.
    pub fn into_reservation(self, now: DateTime<Utc>) -> Reservation {
        Reservation {
            id: self.id,
            venue_id: self.venue_id,
            user_id: self.user_id,
            booking_date: self.booking_date,
            start_time: self.slot.start(),
            end_time: self.slot.end(),
            duration_minutes: self.slot.duration_minutes() as i32,
            player_count: self.player_count,
            status: ReservationStatus::Pending,
            confirmation_policy: self.confirmation_policy,
            reservation_expires_at: Some(self.reservation_expires_at),
            otp_code: self.otp_code,
            otp_expires_at: self.otp_expires_at,
            confirmation_verified: false,
            payment_status: PaymentStatus::Pending,
            amount: self.amount,
            currency: self.currency,
            payment_reference: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            refund_amount: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whole minutes until `at`, negative when `at` has passed.
pub fn minutes_until(now: NaiveDateTime, at: NaiveDateTime) -> i64 {
    (at - now).num_minutes()
}

/// Shift a UTC instant into venue-local wall-clock time.
pub fn to_local(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDateTime {
    now.naive_utc() + Duration::minutes(i64::from(utc_offset_minutes))
}
