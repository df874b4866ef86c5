//! Job implementations run by the runner and the scheduler.

pub mod maintenance;
pub mod sweep;
