//! Background processing for Slotbook.
//!
//! This crate provides:
//! - The expiry sweeper, which expires lapsed holds and completes finished
//!   bookings
//! - A runner that ticks the sweeper until shutdown is signalled
//! - A cron scheduler for the stale-row maintenance purge

pub mod jobs;
pub mod runner;
pub mod scheduler;

pub use jobs::maintenance::StalePurgeJob;
pub use jobs::sweep::{ExpirySweeper, SweepReport};
pub use runner::SweepRunner;
pub use scheduler::CronScheduler;
