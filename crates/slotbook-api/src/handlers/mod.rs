//! HTTP handlers, one module per resource.

pub mod health;
pub mod payment;
pub mod reservation;
pub mod venue;
