//! Reservation lifecycle.

pub mod cancellation;
pub mod code;
pub mod request;
pub mod service;


pub use cancellation::{CancellationPolicy, RefundTier};
pub use request::{CreateReservationRequest, SettlementOutcome, SettlementResult};
pub use service::{CompletionSummary, ReservationService};
