//! Staff-managed availability overrides.

pub mod model;

pub use model::{AvailabilityOverride, UpsertOverride};
