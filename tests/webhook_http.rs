//! Integration tests for the webhook HTTP endpoint.
//!
//! Drive the real router with in-memory stores and assert the
//! acknowledgment class plus the resulting store state for each
//! delivery outcome.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hmac::{Hmac, Mac};
use http_body_util::BodyExt;
use sha2::Sha256;
use tower::ServiceExt;

use paysync::adapters::http::{api_router, AppState};
use paysync::adapters::memory::{
    FailingSubscriptionStore, InMemoryAccountStore, InMemoryFailureLog, InMemorySubscriptionStore,
    StubCheckoutGateway,
};
use paysync::config::{Environment, PaymentConfig};
use paysync::domain::billing::{PaymentStatus, SubscriptionStatus};
use paysync::ports::{AccountStore, FailureLog, SubscriptionStore};

const WEBHOOK_SECRET: &str = "whsec_integration_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    accounts: Arc<InMemoryAccountStore>,
    subscriptions: Arc<InMemorySubscriptionStore>,
    failures: Arc<InMemoryFailureLog>,
    router: axum::Router,
}

fn test_app() -> TestApp {
    let accounts = Arc::new(InMemoryAccountStore::with_account("a@b.com"));
    let subscriptions = Arc::new(InMemorySubscriptionStore::new());
    let failures = Arc::new(InMemoryFailureLog::new());
    let router = router_with(
        accounts.clone(),
        subscriptions.clone(),
        failures.clone(),
    );
    TestApp {
        accounts,
        subscriptions,
        failures,
        router,
    }
}

fn router_with(
    accounts: Arc<dyn AccountStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    failures: Arc<dyn FailureLog>,
) -> axum::Router {
    let state = AppState {
        accounts,
        subscriptions,
        failures,
        checkout_gateway: Arc::new(StubCheckoutGateway::new()),
        payment: PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
            ..Default::default()
        },
        environment: Environment::Development,
        processing_timeout: Duration::from_secs(5),
    };
    api_router().with_state(state)
}

fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

fn signed_request(payload: &str) -> Request<Body> {
    let signature = sign(
        WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
        payload.as_bytes(),
    );
    Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header("Stripe-Signature", signature)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

fn checkout_completed_payload() -> String {
    serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": 1_704_067_200,
        "data": {
            "object": {
                "id": "cs_1",
                "customer": "cus_1",
                "customer_email": "a@b.com",
                "amount_total": 2900
            }
        },
        "livemode": false
    })
    .to_string()
}

fn charge_failed_payload() -> String {
    serde_json::json!({
        "id": "evt_2",
        "type": "charge.failed",
        "created": 1_704_067_200,
        "data": {
            "object": {
                "id": "ch_1",
                "failure_message": "Your card was declined.",
                "metadata": {"email": "a@b.com"}
            }
        },
        "livemode": false
    })
    .to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Acknowledgment Classes
// =============================================================================

#[tokio::test]
async fn valid_event_acknowledges_and_mutates() {
    let app = test_app();

    let response = app
        .router
        .oneshot(signed_request(&checkout_completed_payload()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["received"], true);

    let account = app.accounts.get("a@b.com").unwrap();
    assert_eq!(account.payment_status, PaymentStatus::Paid);
    assert_eq!(account.provider_customer_id.as_deref(), Some("cus_1"));
}

#[tokio::test]
async fn tampered_signature_is_unauthorized_without_mutation() {
    let app = test_app();
    let payload = checkout_completed_payload();

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .header(
            "Stripe-Signature",
            format!("t={},v1={}", chrono::Utc::now().timestamp(), "f".repeat(64)),
        )
        .body(Body::from(payload))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.accounts.get("a@b.com").unwrap().payment_status,
        PaymentStatus::Unpaid
    );
}

#[tokio::test]
async fn missing_signature_header_is_unauthorized() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/stripe")
        .body(Body::from(checkout_completed_payload()))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing signature header");
}

#[tokio::test]
async fn unknown_event_type_acknowledges_success_without_mutation() {
    let app = test_app();
    let payload = serde_json::json!({
        "id": "evt_3",
        "type": "customer.created",
        "created": 1_704_067_200,
        "data": {"object": {"id": "cus_1"}},
        "livemode": false
    })
    .to_string();

    let response = app.router.oneshot(signed_request(&payload)).await.unwrap();

    // Deliberately ignored types must still acknowledge success so the
    // provider stops retrying.
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        app.accounts.get("a@b.com").unwrap().payment_status,
        PaymentStatus::Unpaid
    );
    assert!(app.subscriptions.is_empty());
    assert!(app.failures.entries().is_empty());
}

#[tokio::test]
async fn malformed_known_event_is_bad_request() {
    let app = test_app();
    let payload = serde_json::json!({
        "id": "evt_4",
        "type": "checkout.session.completed",
        "created": 1_704_067_200,
        "data": {"object": {"customer": "cus_1"}},
        "livemode": false
    })
    .to_string();

    let response = app.router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_is_server_error_for_redelivery() {
    let accounts = Arc::new(InMemoryAccountStore::with_account("a@b.com"));
    let failures = Arc::new(InMemoryFailureLog::new());
    let router = router_with(accounts, Arc::new(FailingSubscriptionStore), failures);

    let payload = serde_json::json!({
        "id": "evt_5",
        "type": "customer.subscription.updated",
        "created": 1_704_067_200,
        "data": {
            "object": {
                "id": "sub_1",
                "status": "active",
                "current_period_end": 1_706_745_600,
                "metadata": {"email": "a@b.com"}
            }
        },
        "livemode": false
    })
    .to_string();

    let response = router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn non_post_method_is_method_not_allowed() {
    let app = test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/api/webhooks/stripe")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// Idempotence Across Deliveries
// =============================================================================

#[tokio::test]
async fn redelivered_checkout_event_stays_acknowledged() {
    let app = test_app();
    let payload = checkout_completed_payload();

    let first = app
        .router
        .clone()
        .oneshot(signed_request(&payload))
        .await
        .unwrap();
    let second = app.router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        app.accounts.get("a@b.com").unwrap().payment_status,
        PaymentStatus::Paid
    );
}

#[tokio::test]
async fn duplicate_charge_failed_deliveries_log_once() {
    let app = test_app();
    let payload = charge_failed_payload();

    app.router
        .clone()
        .oneshot(signed_request(&payload))
        .await
        .unwrap();
    let second = app.router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(second.status(), StatusCode::OK);
    let entries = app.failures.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].provider_charge_id, "ch_1");
}

// =============================================================================
// Lifecycle Scenario
// =============================================================================

#[tokio::test]
async fn subscription_lifecycle_converges_regardless_of_order() {
    let app = test_app();

    let update = |period_end: i64, status: &str| {
        serde_json::json!({
            "id": format!("evt_{}", period_end),
            "type": "customer.subscription.updated",
            "created": 1_704_067_200,
            "data": {
                "object": {
                    "id": "sub_1",
                    "status": status,
                    "current_period_end": period_end,
                    "metadata": {"email": "a@b.com"}
                }
            },
            "livemode": false
        })
        .to_string()
    };
    let cancel = serde_json::json!({
        "id": "evt_cancel",
        "type": "customer.subscription.deleted",
        "created": 1_704_067_200,
        "data": {
            "object": {
                "id": "sub_1",
                "status": "canceled",
                "metadata": {"email": "a@b.com"}
            }
        },
        "livemode": false
    })
    .to_string();

    // Later period arrives first, then a stale one, then the cancel, then
    // a stale update again: terminal state must hold throughout.
    for payload in [
        update(2_000_000, "active"),
        update(1_000_000, "active"),
        cancel,
        update(3_000_000, "active"),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(signed_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let record = app.subscriptions.get("a@b.com", "sub_1").unwrap();
    assert_eq!(record.status, SubscriptionStatus::Canceled);
    assert_eq!(
        app.accounts.get("a@b.com").unwrap().payment_status,
        PaymentStatus::Canceled
    );
}
