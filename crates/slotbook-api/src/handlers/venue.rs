//! Venue availability and override handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use slotbook_core::types::id::VenueId;

use crate::dto::request::{AvailabilityQuery, OverrideBody, validate};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/venues/{id}/availability?date=YYYY-MM-DD
pub async fn availability(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let view = state
        .availability
        .availability(VenueId::from_uuid(id), query.date)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": view })))
}

/// PUT /api/venues/{id}/overrides
pub async fn set_override(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<OverrideBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate(&req)?;
    let saved = state
        .availability
        .set_override(&auth, VenueId::from_uuid(id), req.into())
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": saved })))
}
