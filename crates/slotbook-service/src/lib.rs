//! # slotbook-service
//!
//! The slot-reservation engine. Services take their collaborators as
//! `Arc` references at construction time:
//!
//! - [`ConflictDetector`] decides whether an interval is free.
//! - [`ReservationService`] drives the reservation state machine.
//! - [`AvailabilityService`] answers availability queries and manages
//!   staff overrides.
//! - [`PaymentSettlementAdapter`] turns verified gateway callbacks into
//!   exactly one settlement transition.

pub mod availability;
pub mod context;
pub mod notification;
pub mod payment;
pub mod pricing;
pub mod reservation;
pub mod venue;

pub use availability::{AvailabilityService, AvailabilityView, ConflictDetector, ConflictReport};
pub use context::RequestContext;
pub use notification::LogNotifier;
pub use payment::{CheckoutService, PaymentSettlementAdapter, Sha256Signer};
pub use pricing::PriceSchedule;
pub use reservation::{CreateReservationRequest, ReservationService, SettlementOutcome};
pub use venue::{StaticVenueDirectory, Venue, VenueDirectory};
