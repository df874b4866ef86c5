//! PostgreSQL repository implementations.

pub mod availability;
pub mod reservation;

pub use reservation::ReservationRepository;
