//! Gateway settlement callbacks.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use slotbook_core::config::PaymentConfig;
use slotbook_core::error::{AppError, ErrorKind};
use slotbook_core::result::AppResult;

use super::order::OrderReference;
use super::signature::Sha256Signer;
use crate::reservation::{ReservationService, SettlementOutcome, SettlementResult};

/// Form body posted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentNotice {
    pub merchant_id: String,
    pub order_id: String,
    pub payment_id: String,
    pub amount: String,
    pub currency: String,
    pub status_code: String,
    pub signature: String,
}

impl PaymentNotice {
    fn signed_fields(&self) -> [&str; 5] {
        [
            &self.merchant_id,
            &self.order_id,
            &self.amount,
            &self.currency,
            &self.status_code,
        ]
    }
}

/// What the adapter did with a verified notice.
#[derive(Debug, Clone)]
pub enum NoticeOutcome {
    /// Status code `0`: payment still in progress, nothing applied.
    Acknowledged,
    Settled(SettlementResult),
}

/// Status code reported by the gateway.
fn outcome_for(status_code: &str) -> AppResult<Option<SettlementOutcome>> {
    match status_code.trim() {
        "2" => Ok(Some(SettlementOutcome::Success)),
        "0" => Ok(None),
        "-1" => Ok(Some(SettlementOutcome::Cancelled)),
        "-2" => Ok(Some(SettlementOutcome::Failure)),
        "-3" => Ok(Some(SettlementOutcome::Chargedback)),
        other => Err(AppError::validation(format!("Unknown status code '{other}'"))),
    }
}

/// Turns verified gateway callbacks into settlement transitions.
///
/// Anything that fails verification is rejected with a validation error
/// before any record is read for writing. Store failures propagate as-is so
/// the gateway retries.
#[derive(Debug, Clone)]
pub struct PaymentSettlementAdapter {
    reservations: Arc<ReservationService>,
    signer: Sha256Signer,
    config: PaymentConfig,
}

impl PaymentSettlementAdapter {
    pub fn new(reservations: Arc<ReservationService>, config: PaymentConfig) -> Self {
        let signer = Sha256Signer::new(&config.merchant_secret);
        Self {
            reservations,
            signer,
            config,
        }
    }

    pub async fn handle(&self, notice: PaymentNotice) -> AppResult<NoticeOutcome> {
        if notice.merchant_id != self.config.merchant_id {
            warn!(order_id = %notice.order_id, "Payment notice for another merchant rejected");
            return Err(AppError::validation("Merchant mismatch"));
        }
        if !self.signer.verify(&notice.signed_fields(), &notice.signature) {
            warn!(order_id = %notice.order_id, "Payment notice signature rejected");
            return Err(AppError::validation("Invalid signature"));
        }

        let order = OrderReference::parse(&self.config.order_prefix, &notice.order_id)
            .inspect_err(|e| warn!(order_id = %notice.order_id, error = %e, "Payment notice rejected"))?;
        let Some(outcome) = outcome_for(&notice.status_code)? else {
            info!(order_id = %notice.order_id, "Payment pending at gateway");
            return Ok(NoticeOutcome::Acknowledged);
        };

        let reservation = match self.reservations.find(order.reservation_id).await {
            Ok(r) => r,
            Err(e) if e.kind == ErrorKind::NotFound => {
                warn!(order_id = %notice.order_id, "Payment notice for unknown reservation");
                return Err(AppError::validation("Unknown order"));
            }
            Err(e) => return Err(e),
        };

        let amount = Decimal::from_str(notice.amount.trim())
            .map_err(|_| AppError::validation("Malformed amount"))?;
        if amount.round_dp(2) != reservation.amount.round_dp(2)
            || !notice.currency.eq_ignore_ascii_case(&reservation.currency)
        {
            warn!(
                reservation_id = %reservation.id,
                expected = %reservation.amount,
                received = %amount,
                "Payment notice amount mismatch"
            );
            return Err(AppError::validation("Amount or currency mismatch"));
        }

        let external_ref = Some(notice.payment_id.clone()).filter(|p| !p.is_empty());
        let result = self
            .reservations
            .settle_payment(reservation.id, outcome, external_ref)
            .await?;
        Ok(NoticeOutcome::Settled(result))
    }
}
