//! Notification delivery.

pub mod logger;

pub use logger::{LogNotifier, dispatch};
