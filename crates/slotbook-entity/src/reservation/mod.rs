//! Reservation (booking) domain entities.

pub mod model;
pub mod slot;
pub mod status;

pub use model::{minutes_until, to_local, NewReservation, Reservation};
pub use slot::TimeSlot;
pub use status::{ConfirmationPolicy, PaymentStatus, ReservationStatus};
