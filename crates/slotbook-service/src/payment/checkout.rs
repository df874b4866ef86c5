//! Hosted checkout session parameters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use slotbook_core::config::PaymentConfig;
use slotbook_core::result::AppResult;
use slotbook_core::types::id::ReservationId;

use super::order::OrderReference;
use super::signature::Sha256Signer;
use crate::context::RequestContext;
use crate::reservation::ReservationService;

/// Everything a client needs to redirect to the gateway's hosted page.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub merchant_id: String,
    pub order_id: String,
    pub amount: String,
    pub currency: String,
    /// The payment must complete before the hold lapses.
    pub expires_at: Option<DateTime<Utc>>,
    pub notify_url: String,
    pub signature: String,
}

/// Builds signed checkout sessions for payable reservations.
///
/// No store lock is held here; the client talks to the gateway afterwards.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    reservations: Arc<ReservationService>,
    signer: Sha256Signer,
    config: PaymentConfig,
}

impl CheckoutService {
    pub fn new(reservations: Arc<ReservationService>, config: PaymentConfig) -> Self {
        let signer = Sha256Signer::new(&config.merchant_secret);
        Self {
            reservations,
            signer,
            config,
        }
    }

    pub async fn create_session(
        &self,
        ctx: &RequestContext,
        id: ReservationId,
    ) -> AppResult<CheckoutSession> {
        let reservation = self.reservations.payable(ctx, id).await?;

        let order_id = OrderReference::new(reservation.id).format(&self.config.order_prefix);
        let amount = format!("{:.2}", reservation.amount);
        let signature = self.signer.sign(&[
            &self.config.merchant_id,
            &order_id,
            &amount,
            &reservation.currency,
        ]);

        info!(reservation_id = %reservation.id, order_id = %order_id, "Checkout session created");

        Ok(CheckoutSession {
            checkout_url: self.config.checkout_url.clone(),
            merchant_id: self.config.merchant_id.clone(),
            order_id,
            amount,
            currency: reservation.currency,
            expires_at: reservation.reservation_expires_at,
            notify_url: self.config.notify_url.clone(),
            signature,
        })
    }
}
