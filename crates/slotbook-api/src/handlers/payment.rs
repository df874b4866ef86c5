//! Payment gateway callback.

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};

use slotbook_core::AppError;
use slotbook_service::payment::{NoticeOutcome, PaymentNotice};

use crate::dto::ApiResponse;
use crate::dto::response::NoticeResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/payments/notify
///
/// Unauthenticated; trust comes from the payload signature. Rejected or
/// malformed notices answer 400 and store failures 503 so the gateway
/// retries only the latter.
pub async fn notify(
    State(state): State<AppState>,
    form: Result<Form<PaymentNotice>, FormRejection>,
) -> Result<Json<ApiResponse<NoticeResponse>>, ApiError> {
    let Form(notice) = form.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Malformed payment notice");
        AppError::validation(format!("Malformed payment notice: {}", rejection.body_text()))
    })?;

    let response = match state.settlement.handle(notice).await? {
        NoticeOutcome::Acknowledged => NoticeResponse {
            applied: false,
            status: None,
            payment_status: None,
        },
        NoticeOutcome::Settled(result) => NoticeResponse {
            applied: result.applied,
            status: Some(result.reservation.status),
            payment_status: Some(result.reservation.payment_status),
        },
    };
    Ok(Json(ApiResponse::ok(response)))
}
