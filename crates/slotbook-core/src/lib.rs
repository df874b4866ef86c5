//! # slotbook-core
//!
//! Core crate for Slotbook. Contains the unified error system, configuration
//! schemas, typed identifiers, pagination types, and the collaborator traits
//! (clock, notifier) shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Slotbook crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
