//! Route definitions for the Slotbook HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router with every route, without middleware.
///
/// Layers are added by [`crate::app::build_app`].
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(reservation_routes())
        .merge(venue_routes())
        .merge(payment_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Reservation lifecycle
fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reservations",
            get(handlers::reservation::list_reservations)
                .post(handlers::reservation::create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(handlers::reservation::get_reservation),
        )
        .route(
            "/reservations/{id}/confirm-code",
            post(handlers::reservation::confirm_code),
        )
        .route(
            "/reservations/{id}/resend-code",
            post(handlers::reservation::resend_code),
        )
        .route(
            "/reservations/{id}/extend",
            post(handlers::reservation::extend_reservation),
        )
        .route(
            "/reservations/{id}/cancel",
            post(handlers::reservation::cancel_reservation),
        )
        .route(
            "/reservations/{id}/checkout",
            post(handlers::reservation::checkout),
        )
}

/// Availability and staff overrides
fn venue_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/venues/{id}/availability",
            get(handlers::venue::availability),
        )
        .route("/venues/{id}/overrides", put(handlers::venue::set_override))
}

/// Gateway callbacks (signature-verified, no bearer token)
fn payment_routes() -> Router<AppState> {
    Router::new().route("/payments/notify", post(handlers::payment::notify))
}

/// Health check (unauthenticated)
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
