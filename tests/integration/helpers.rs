//! Shared test helpers for integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use slotbook_api::AppState;
use slotbook_api::auth::Claims;
use slotbook_core::config::AppConfig;
use slotbook_core::result::AppResult;
use slotbook_core::traits::{Clock, ManualClock, Notification, Notifier};
use slotbook_database::MemoryReservationStore;
use slotbook_entity::user::UserRole;
use slotbook_service::Sha256Signer;

pub const JWT_SECRET: &str = "integration-secret";
pub const MERCHANT_ID: &str = "M-100";
pub const MERCHANT_SECRET: &str = "merchant-secret";
pub const VENUE_ID: &str = "0b0e5f7a-4c1d-4e55-9d7a-6f2a9d1c3b01";

/// Keeps every notification so tests can read issued codes.
#[derive(Debug, Default)]
pub struct CapturingNotifier {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn notify(&self, notification: Notification) -> AppResult<()> {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push(notification);
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum app with every layer applied
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: MemoryReservationStore,
    notifier: Arc<CapturingNotifier>,
}

impl TestApp {
    /// Memory-backed app with the clock at 2025-05-31T09:00Z.
    pub fn new() -> Self {
        let config: AppConfig = serde_json::from_value(json!({
            "store": { "backend": "memory" },
            "auth": { "jwt_secret": JWT_SECRET },
            "payment": {
                "merchant_id": MERCHANT_ID,
                "merchant_secret": MERCHANT_SECRET,
                "notify_url": "http://localhost/api/payments/notify",
            },
            "venues": [{
                "id": VENUE_ID,
                "name": "Court 1",
                "opens_at": "08:00:00",
                "closes_at": "22:00:00",
                "hourly_rate": "1000",
            }],
        }))
        .expect("test config should deserialize");

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 31, 9, 0, 0).unwrap(),
        ));
        let store = MemoryReservationStore::new();
        let notifier = Arc::new(CapturingNotifier::default());

        let state = AppState::new(
            config,
            Arc::new(store.clone()),
            clock.clone(),
            notifier.clone(),
        );
        let router = slotbook_api::build_app(state.clone());

        Self {
            router,
            state,
            clock,
            store,
            notifier,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Bearer token as the external auth service would mint it.
    pub fn token(&self, user_id: Uuid, role: UserRole) -> String {
        let claims = Claims {
            sub: user_id,
            role,
            exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
            iat: Some(Utc::now().timestamp()),
            iss: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode token")
    }

    pub fn customer(&self) -> String {
        self.token(Uuid::new_v4(), UserRole::Customer)
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Post a form-encoded gateway callback.
    pub async fn notify(&self, form: String) -> TestResponse {
        let req = Request::builder()
            .method("POST")
            .uri("/api/payments/notify")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Book `start`-`end` on 2025-06-01 and return the created record.
    pub async fn book(&self, token: &str, start: &str, end: &str, policy: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/reservations",
            Some(json!({
                "venue_id": VENUE_ID,
                "booking_date": "2025-06-01",
                "start_time": start,
                "end_time": end,
                "player_count": 4,
                "confirmation_policy": policy,
            })),
            Some(token),
        )
        .await
    }

    /// Most recent code issued for `reservation_id`.
    pub async fn issued_code(&self, reservation_id: &str) -> String {
        self.code_other_than(reservation_id, None).await
    }

    /// Most recent code for `reservation_id` that differs from `previous`.
    ///
    /// Notifications are dispatched on a spawned task, so yield until it lands.
    pub async fn code_other_than(&self, reservation_id: &str, previous: Option<&str>) -> String {
        for _ in 0..100 {
            let found = self
                .notifier
                .sent
                .lock()
                .expect("notifier lock poisoned")
                .iter()
                .rev()
                .find_map(|n| match n {
                    Notification::CodeIssued {
                        reservation_id: id,
                        code,
                        ..
                    } if id.to_string() == reservation_id => Some(code.clone()),
                    _ => None,
                });
            match found {
                Some(code) if Some(code.as_str()) != previous => return code,
                _ => {}
            }
            tokio::task::yield_now().await;
        }
        panic!("no code issued for {reservation_id}");
    }
}

/// Decimal fields serialize as strings.
pub fn dec(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("not a decimal: {value}"))
}

/// Signed gateway form body.
pub fn signed_notice(order_id: &str, amount: &str, currency: &str, status_code: &str) -> String {
    let signature = Sha256Signer::new(MERCHANT_SECRET).sign(&[
        MERCHANT_ID,
        order_id,
        amount,
        currency,
        status_code,
    ]);
    format!(
        "merchant_id={MERCHANT_ID}&order_id={order_id}&payment_id=PAY-1&amount={amount}\
         &currency={currency}&status_code={status_code}&signature={signature}"
    )
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> String {
        self.data()["id"]
            .as_str()
            .expect("response has no id")
            .to_string()
    }
}
