//! Integration tests for checkout and gateway settlement callbacks.

use axum::http::StatusCode;
use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;

use slotbook_worker::ExpirySweeper;

use crate::helpers::{TestApp, dec, signed_notice};

/// Book 10:00-11:00 and open a checkout session; returns (id, order_id, amount).
async fn checked_out(app: &TestApp, token: &str) -> (String, String, String) {
    let id = app.book(token, "10:00:00", "11:00:00", "direct").await.id();
    let response = app
        .request(
            "POST",
            &format!("/api/reservations/{id}/checkout"),
            None,
            Some(token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let session = response.data();
    (
        id,
        session["order_id"].as_str().unwrap().to_string(),
        session["amount"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_checkout_session_quotes_venue_rate() {
    let app = TestApp::new();
    let token = app.customer();
    let (id, order_id, amount) = checked_out(&app, &token).await;

    assert_eq!(order_id, format!("SB-{id}"));
    assert_eq!(amount, "1000.00");
}

#[tokio::test]
async fn test_verified_success_confirms_once() {
    let app = TestApp::new();
    let token = app.customer();
    let (id, order_id, amount) = checked_out(&app, &token).await;

    let response = app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["applied"], true);
    assert_eq!(response.data()["status"], "confirmed");
    assert_eq!(response.data()["payment_status"], "paid");

    let writes = app.store.write_count();
    let response = app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["applied"], false);
    assert_eq!(app.store.write_count(), writes);

    let response = app
        .request("GET", &format!("/api/reservations/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.data()["status"], "confirmed");
    assert_eq!(response.data()["payment_reference"], "PAY-1");
    assert!(response.data()["reservation_expires_at"].is_null());

    // Confirmed bookings hold the slot past the original deadline.
    app.clock.advance(Duration::minutes(30));
    let clash = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(clash.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_forged_notice_is_rejected_without_mutation() {
    let app = TestApp::new();
    let token = app.customer();
    let (id, order_id, amount) = checked_out(&app, &token).await;

    let forged = signed_notice(&order_id, &amount, "USD", "2").replace("amount=1000.00", "amount=1.00");
    let response = app.notify(forged).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");

    let underpaid = app.notify(signed_notice(&order_id, "1.00", "USD", "2")).await;
    assert_eq!(underpaid.status, StatusCode::BAD_REQUEST);

    let response = app
        .request("GET", &format!("/api/reservations/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.data()["status"], "pending");
    assert_eq!(response.data()["payment_status"], "pending");
}

#[tokio::test]
async fn test_pending_notice_is_acknowledged() {
    let app = TestApp::new();
    let (_, order_id, amount) = checked_out(&app, &app.customer()).await;

    let response = app.notify(signed_notice(&order_id, &amount, "USD", "0")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["applied"], false);
    assert!(response.data()["status"].is_null());
}

#[tokio::test]
async fn test_failed_payment_releases_slot() {
    let app = TestApp::new();
    let (_, order_id, amount) = checked_out(&app, &app.customer()).await;

    let response = app.notify(signed_notice(&order_id, &amount, "USD", "-2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "cancelled");
    assert_eq!(response.data()["payment_status"], "failed");

    let rebook = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(rebook.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_success_after_sweep_is_ignored() {
    let app = TestApp::new();
    let token = app.customer();
    let (id, order_id, amount) = checked_out(&app, &token).await;

    app.clock.advance(Duration::minutes(16));
    let report = ExpirySweeper::new(app.state.reservations.clone(), 100)
        .run_once()
        .await
        .unwrap();
    assert_eq!(report.expired, 1);

    let response = app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["applied"], false);
    assert_eq!(response.data()["status"], "expired");

    let response = app
        .request("GET", &format!("/api/reservations/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.data()["payment_status"], "pending");
}

#[tokio::test]
async fn test_late_success_after_takeover_is_refunded() {
    let app = TestApp::new();
    let first = app.customer();
    let (id, order_id, amount) = checked_out(&app, &first).await;

    app.clock.advance(Duration::minutes(16));
    let second = app.book(&app.customer(), "10:00:00", "11:00:00", "direct").await;
    assert_eq!(second.status, StatusCode::CREATED);

    let response = app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["applied"], true);
    assert_eq!(response.data()["status"], "cancelled");
    assert_eq!(response.data()["payment_status"], "paid");

    let response = app
        .request("GET", &format!("/api/reservations/{id}"), None, Some(&first))
        .await;
    assert_eq!(dec(&response.data()["refund_amount"]), Decimal::from(1000));
}

#[tokio::test]
async fn test_late_success_with_free_slot_confirms() {
    let app = TestApp::new();
    let (_, order_id, amount) = checked_out(&app, &app.customer()).await;

    app.clock.advance(Duration::minutes(16));
    let response = app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "confirmed");
}

#[tokio::test]
async fn test_paid_cancellation_refunds_by_notice_period() {
    let app = TestApp::new();
    let token = app.customer();
    let (id, order_id, amount) = checked_out(&app, &token).await;
    app.notify(signed_notice(&order_id, &amount, "USD", "2")).await;

    // 25 hours before start: full refund tier.
    let response = app
        .request(
            "POST",
            &format!("/api/reservations/{id}/cancel"),
            Some(json!({})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["status"], "cancelled");
    assert_eq!(response.data()["payment_status"], "paid");
    assert_eq!(dec(&response.data()["refund_amount"]), Decimal::from(1000));
}
