//! Core traits defined in `slotbook-core` and implemented by other crates.

pub mod clock;
pub mod notifier;

pub use clock::{Clock, ManualClock, SystemClock};
pub use notifier::{Notification, Notifier};
