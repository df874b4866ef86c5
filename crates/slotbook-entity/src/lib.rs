//! # slotbook-entity
//!
//! Domain entity models for Slotbook. Every struct in this crate represents
//! a database table row or a domain value object. Database entities derive
//! `sqlx::FromRow`; status enums map onto PostgreSQL enum types.

pub mod availability;
pub mod reservation;
pub mod user;

pub use availability::{AvailabilityOverride, UpsertOverride};
pub use reservation::{
    ConfirmationPolicy, NewReservation, PaymentStatus, Reservation, ReservationStatus, TimeSlot,
};
pub use user::UserRole;
