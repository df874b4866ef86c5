//! Slot availability: conflict detection and the availability view.

pub mod detector;
pub mod service;

pub use detector::{ConflictDetector, ConflictReport};
pub use service::{AvailabilityService, AvailabilityView, OccupiedSlot, OverrideRequest};
