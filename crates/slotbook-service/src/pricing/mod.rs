//! Slot pricing.

pub mod schedule;

pub use schedule::{PeakWindow, PriceSchedule};
