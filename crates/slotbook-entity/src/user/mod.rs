//! Actor identity as seen by the reservation engine.

pub mod role;

pub use role::UserRole;
