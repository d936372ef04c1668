//! Integration tests for the checkout session HTTP endpoint.
//!
//! Drive the real router with a stub gateway and assert validation
//! behavior, provider-call avoidance, and error presentation.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use paysync::adapters::http::{api_router, AppState};
use paysync::adapters::memory::{
    InMemoryAccountStore, InMemoryFailureLog, InMemorySubscriptionStore, StubCheckoutGateway,
};
use paysync::config::{Environment, PaymentConfig};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn router_with(gateway: Arc<StubCheckoutGateway>, environment: Environment) -> axum::Router {
    let state = AppState {
        accounts: Arc::new(InMemoryAccountStore::new()),
        subscriptions: Arc::new(InMemorySubscriptionStore::new()),
        failures: Arc::new(InMemoryFailureLog::new()),
        checkout_gateway: gateway,
        payment: PaymentConfig {
            stripe_api_key: "sk_test_xxx".to_string(),
            stripe_webhook_secret: "whsec_xxx".to_string(),
            site_url: "http://localhost:3000".to_string(),
            ..Default::default()
        },
        environment,
        processing_timeout: Duration::from_secs(5),
    };
    api_router().with_state(state)
}

fn checkout_request(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/checkout/sessions")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn valid_request_returns_session_id_and_url() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway.clone(), Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123",
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["sessionId"].as_str().unwrap().is_empty());
    assert!(!body["url"].as_str().unwrap().is_empty());

    // The gateway received the redirect targets and metadata inputs
    let request = &gateway.requests()[0];
    assert_eq!(
        request.success_url,
        "http://localhost:3000/dashboard?success=true"
    );
    assert_eq!(request.cancel_url, "http://localhost:3000?canceled=true");
}

#[tokio::test]
async fn mode_defaults_to_subscription_when_absent() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway.clone(), Environment::Development);

    router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123",
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(gateway.requests()[0].mode.as_str(), "subscription");
}

// =============================================================================
// Validation Failures (no provider call)
// =============================================================================

#[tokio::test]
async fn missing_price_id_is_bad_request_without_provider_call() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway.clone(), Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing priceId");
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn invalid_email_is_bad_request_without_provider_call() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway.clone(), Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123",
            "email": "not-an-email"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid email");
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn missing_email_is_bad_request_without_provider_call() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway.clone(), Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing email");
    assert_eq!(gateway.call_count(), 0);
}

// =============================================================================
// Provider Outcomes
// =============================================================================

#[tokio::test]
async fn provider_rejection_is_bad_request_with_details() {
    let gateway = Arc::new(StubCheckoutGateway::rejecting("No such price: price_zzz"));
    let router = router_with(gateway, Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_zzz",
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid payment parameters");
    assert_eq!(body["details"], "No such price: price_zzz");
}

#[tokio::test]
async fn provider_outage_is_server_error_with_generic_message_in_production() {
    let gateway = Arc::new(StubCheckoutGateway::failing("connection reset by peer"));
    let router = router_with(gateway, Environment::Production);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123",
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to create checkout session");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn provider_outage_includes_diagnostics_outside_production() {
    let gateway = Arc::new(StubCheckoutGateway::failing("connection reset by peer"));
    let router = router_with(gateway, Environment::Development);

    let response = router
        .oneshot(checkout_request(serde_json::json!({
            "priceId": "price_123",
            "email": "a@b.com"
        })))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["message"], "connection reset by peer");
}

// =============================================================================
// Method Routing
// =============================================================================

#[tokio::test]
async fn non_post_method_is_method_not_allowed() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway, Environment::Development);

    let request = Request::builder()
        .method("GET")
        .uri("/api/checkout/sessions")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn health_endpoint_responds_ok() {
    let gateway = Arc::new(StubCheckoutGateway::new());
    let router = router_with(gateway, Environment::Development);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
