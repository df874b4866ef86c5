//! Reservation lifecycle handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use slotbook_core::types::id::ReservationId;

use crate::dto::request::{
    CancelBody, ConfirmCodeBody, CreateReservationBody, ExtendBody, validate,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::state::AppState;

/// POST /api/reservations
pub async fn create_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateReservationBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    validate(&req)?;
    let reservation = state.reservations.create(&auth, req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": reservation })),
    ))
}

/// GET /api/reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = state
        .reservations
        .list_mine(&auth, params.into_page_request())
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": page })))
}

/// GET /api/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let reservation = state
        .reservations
        .get(&auth, ReservationId::from_uuid(id))
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": reservation }),
    ))
}

/// POST /api/reservations/{id}/confirm-code
pub async fn confirm_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ConfirmCodeBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let reservation = state
        .reservations
        .confirm_code(&auth, ReservationId::from_uuid(id), &req.code)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": reservation }),
    ))
}

/// POST /api/reservations/{id}/resend-code
///
/// The code itself goes out through the notifier, never in the response.
pub async fn resend_code(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let reservation = state
        .reservations
        .resend_code(&auth, ReservationId::from_uuid(id))
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "data": {
            "id": reservation.id,
            "code_expires_at": reservation.otp_expires_at,
        }
    })))
}

/// POST /api/reservations/{id}/extend
pub async fn extend_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ExtendBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let reservation = state
        .reservations
        .extend(&auth, ReservationId::from_uuid(id), req.minutes)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": reservation }),
    ))
}

/// POST /api/reservations/{id}/cancel
pub async fn cancel_reservation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let reservation = state
        .reservations
        .cancel(&auth, ReservationId::from_uuid(id), req.reason)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": reservation }),
    ))
}

/// POST /api/reservations/{id}/checkout
pub async fn checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state
        .checkout
        .create_session(&auth, ReservationId::from_uuid(id))
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": session })))
}
