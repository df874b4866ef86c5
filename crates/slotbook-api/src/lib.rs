//! # slotbook-api
//!
//! HTTP API layer for Slotbook built on Axum.
//!
//! Provides the reservation, availability and payment endpoints, bearer
//! token verification, middleware (CORS, logging, compression), extractors,
//! DTOs, and error mapping.

pub mod app;
pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use state::AppState;
