//! Integration tests for the reservation lifecycle.

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use slotbook_entity::user::UserRole;

use crate::helpers::{TestApp, dec};

fn ts(value: &serde_json::Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).expect("timestamp")
}

#[tokio::test]
async fn test_create_holds_slot_for_reservation_window() {
    let app = TestApp::new();
    let token = app.customer();

    let response = app.book(&token, "10:00:00", "11:00:00", "direct").await;
    assert_eq!(response.status, StatusCode::CREATED);

    let data = response.data();
    assert_eq!(data["status"], "pending");
    assert_eq!(data["payment_status"], "pending");
    assert_eq!(data["duration_minutes"], 60);
    assert!(data.get("otp_code").is_none());
    assert_eq!(
        ts(&data["reservation_expires_at"]),
        app.clock_now() + Duration::minutes(15)
    );
}

#[tokio::test]
async fn test_requests_require_a_valid_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/reservations", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "AUTHENTICATION");

    let response = app
        .request("GET", "/api/reservations", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_overlapping_request_is_rejected_while_hold_is_active() {
    let app = TestApp::new();
    let first = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(first.status, StatusCode::CREATED);

    let clash = app.book(&app.customer(), "10:30:00", "11:30:00", "direct").await;
    assert_eq!(clash.status, StatusCode::CONFLICT);
    assert_eq!(clash.body["error"], "SLOT_CONFLICT");
    assert_eq!(clash.body["retryable"], false);

    let adjacent = app.book(&app.customer(), "11:00:00", "12:00:00", "direct").await;
    assert_eq!(adjacent.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_lapsed_hold_no_longer_blocks_before_sweep() {
    let app = TestApp::new();
    let first = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(first.status, StatusCode::CREATED);

    app.clock.advance(Duration::minutes(16));

    let second = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(second.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let app = TestApp::new();
    let token = app.customer();

    let reversed = app.book(&token, "11:00:00", "10:00:00", "direct").await;
    assert_eq!(reversed.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/reservations",
            Some(json!({
                "venue_id": crate::helpers::VENUE_ID,
                "booking_date": "2025-05-31",
                "start_time": "08:00:00",
                "end_time": "09:00:00",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/reservations",
            Some(json!({
                "venue_id": crate::helpers::VENUE_ID,
                "booking_date": "2025-06-01",
                "start_time": "10:00:00",
                "end_time": "11:00:00",
                "player_count": 0,
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_reservations_are_private_to_their_owner() {
    let app = TestApp::new();
    let owner = app.customer();
    let id = app.book(&owner, "10:00:00", "11:00:00", "direct").await.id();
    let path = format!("/api/reservations/{id}");

    let response = app.request("GET", &path, None, Some(&owner)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.id(), id);

    let stranger = app.customer();
    let response = app.request("GET", &path, None, Some(&stranger)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let staff = app.token(Uuid::new_v4(), UserRole::Staff);
    let response = app.request("GET", &path, None, Some(&staff)).await;
    assert_eq!(response.status, StatusCode::OK);

    let missing = format!("/api/reservations/{}", Uuid::new_v4());
    let response = app.request("GET", &missing, None, Some(&owner)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_returns_only_own_reservations() {
    let app = TestApp::new();
    let owner = app.customer();
    app.book(&owner, "10:00:00", "11:00:00", "direct").await;
    app.book(&owner, "12:00:00", "13:00:00", "direct").await;
    app.book(&app.customer(), "14:00:00", "15:00:00", "direct").await;

    let response = app
        .request("GET", "/api/reservations?page=1&per_page=10", None, Some(&owner))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["total_items"], 2);
    assert_eq!(response.data()["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_code_gated_reservation_must_verify_before_checkout() {
    let app = TestApp::new();
    let token = app.customer();
    let id = app.book(&token, "10:00:00", "11:00:00", "code_gated").await.id();

    let checkout = format!("/api/reservations/{id}/checkout");
    let response = app.request("POST", &checkout, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "INVALID_TRANSITION");

    let confirm = format!("/api/reservations/{id}/confirm-code");
    let response = app
        .request("POST", &confirm, Some(json!({ "code": "not-it" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "INVALID_CODE");

    let code = app.issued_code(&id).await;
    let response = app
        .request("POST", &confirm, Some(json!({ "code": code })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "pending");
    assert_eq!(response.data()["confirmation_verified"], true);

    let response = app.request("POST", &checkout, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_code_can_be_resent() {
    let app = TestApp::new();
    let token = app.customer();
    let id = app.book(&token, "10:00:00", "11:00:00", "code_gated").await.id();
    let first = app.issued_code(&id).await;

    app.clock.advance(Duration::minutes(6));
    let confirm = format!("/api/reservations/{id}/confirm-code");
    let response = app
        .request("POST", &confirm, Some(json!({ "code": first })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "CODE_EXPIRED");

    let resend = format!("/api/reservations/{id}/resend-code");
    let response = app.request("POST", &resend, None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.data().get("code").is_none());
    assert_eq!(
        ts(&response.data()["code_expires_at"]),
        app.clock_now() + Duration::minutes(5)
    );

    let fresh = app.code_other_than(&id, Some(first.as_str())).await;
    let response = app
        .request("POST", &confirm, Some(json!({ "code": fresh })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_extend_moves_hold_deadline() {
    let app = TestApp::new();
    let token = app.customer();
    let created = app.book(&token, "10:00:00", "11:00:00", "direct").await;
    let id = created.id();
    let before = ts(&created.data()["reservation_expires_at"]);

    let path = format!("/api/reservations/{id}/extend");
    let response = app
        .request("POST", &path, Some(json!({ "minutes": 10 })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        ts(&response.data()["reservation_expires_at"]),
        before + Duration::minutes(10)
    );

    let response = app
        .request("POST", &path, Some(json!({ "minutes": 0 })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_releases_slot_and_is_final() {
    let app = TestApp::new();
    let token = app.customer();
    let id = app.book(&token, "10:00:00", "11:00:00", "direct").await.id();

    let path = format!("/api/reservations/{id}/cancel");
    let response = app
        .request("POST", &path, Some(json!({ "reason": "plans changed" })), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "cancelled");
    assert_eq!(response.data()["cancellation_reason"], "plans changed");
    assert_eq!(dec(&response.data()["refund_amount"]), Decimal::ZERO);

    let response = app.request("POST", &path, Some(json!({})), Some(&token)).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let rebook = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(rebook.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "ok");
    assert_eq!(response.data()["store"], "connected");
}
