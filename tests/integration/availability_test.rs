//! Integration tests for availability queries and staff overrides.

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use slotbook_entity::user::UserRole;

use crate::helpers::{TestApp, VENUE_ID};

fn availability_path() -> String {
    format!("/api/venues/{VENUE_ID}/availability?date=2025-06-01")
}

#[tokio::test]
async fn test_availability_lists_active_holds_and_open_grid() {
    let app = TestApp::new();
    let token = app.customer();

    let response = app.request("GET", &availability_path(), None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    // 08:00-22:00 in one-hour cells.
    assert_eq!(response.data()["open_slots"].as_array().map(Vec::len), Some(14));

    let id = app.book(&token, "10:00:00", "11:00:00", "direct").await.id();
    let response = app.request("GET", &availability_path(), None, Some(&token)).await;
    let reservations = response.data()["reservations"].as_array().unwrap();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0]["reservation_id"], id.as_str());
    assert!(reservations[0].get("user_id").is_none());
    assert_eq!(response.data()["open_slots"].as_array().map(Vec::len), Some(13));

    // A lapsed hold disappears even before the sweeper runs.
    app.clock.advance(Duration::minutes(16));
    let response = app.request("GET", &availability_path(), None, Some(&token)).await;
    assert_eq!(response.data()["reservations"].as_array().map(Vec::len), Some(0));
    assert_eq!(response.data()["open_slots"].as_array().map(Vec::len), Some(14));
}

#[tokio::test]
async fn test_staff_block_prevents_booking() {
    let app = TestApp::new();
    let staff = app.token(Uuid::new_v4(), UserRole::Staff);
    let path = format!("/api/venues/{VENUE_ID}/overrides");
    let block = json!({
        "date": "2025-06-01",
        "start_time": "12:00:00",
        "end_time": "14:00:00",
        "reason": "tournament",
    });

    let response = app
        .request("PUT", &path, Some(block.clone()), Some(&app.customer()))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("PUT", &path, Some(block), Some(&staff)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["is_blocked"], true);

    let blocked = app.book(&app.customer(), "13:00:00", "14:00:00", "direct").await;
    assert_eq!(blocked.status, StatusCode::CONFLICT);
    assert_eq!(blocked.body["error"], "SLOT_CONFLICT");

    let unblock = json!({
        "date": "2025-06-01",
        "start_time": "12:00:00",
        "end_time": "14:00:00",
        "is_blocked": false,
    });
    let response = app.request("PUT", &path, Some(unblock), Some(&staff)).await;
    assert_eq!(response.status, StatusCode::OK);

    let booked = app.book(&app.customer(), "13:00:00", "14:00:00", "direct").await;
    assert_eq!(booked.status, StatusCode::CREATED);
}
