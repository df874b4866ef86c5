//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use slotbook_core::config::AppConfig;
use slotbook_core::traits::{Clock, Notifier};
use slotbook_database::store::ReservationStore;
use slotbook_service::{
    AvailabilityService, CheckoutService, PaymentSettlementAdapter, PriceSchedule,
    ReservationService, StaticVenueDirectory, VenueDirectory,
};

use crate::auth::JwtDecoder;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Reservation store (PostgreSQL or in-memory)
    pub store: Arc<dyn ReservationStore>,
    pub clock: Arc<dyn Clock>,

    // ── Auth ─────────────────────────────────────────────────
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    pub reservations: Arc<ReservationService>,
    pub availability: Arc<AvailabilityService>,
    pub checkout: Arc<CheckoutService>,
    pub settlement: Arc<PaymentSettlementAdapter>,
}

impl AppState {
    /// Wire every service from configuration and the shared collaborators.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ReservationStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let venues: Arc<dyn VenueDirectory> =
            Arc::new(StaticVenueDirectory::from_config(&config.venues));
        let pricing = Arc::new(PriceSchedule::from_config(&config.pricing));

        let reservations = Arc::new(ReservationService::new(
            Arc::clone(&store),
            Arc::clone(&venues),
            pricing,
            notifier,
            Arc::clone(&clock),
            config.booking.clone(),
        ));
        let availability = Arc::new(AvailabilityService::new(
            Arc::clone(&store),
            venues,
            Arc::clone(&clock),
        ));
        let checkout = Arc::new(CheckoutService::new(
            Arc::clone(&reservations),
            config.payment.clone(),
        ));
        let settlement = Arc::new(PaymentSettlementAdapter::new(
            Arc::clone(&reservations),
            config.payment.clone(),
        ));

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            store,
            clock,
            reservations,
            availability,
            checkout,
            settlement,
        }
    }
}
