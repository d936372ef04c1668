//! Axum router configuration.
//!
//! Both payment endpoints accept only `POST`; axum's method routing
//! answers anything else with 405.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_checkout_session, handle_stripe_webhook, health, AppState};

/// Webhook routes. Separate from client routes: deliveries authenticate
/// via signature, not user credentials.
///
/// # Routes
/// - `POST /stripe` - process a provider webhook delivery
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/stripe", post(handle_stripe_webhook))
}

/// Client-facing checkout routes.
///
/// # Routes
/// - `POST /sessions` - open a provider checkout session
pub fn checkout_routes() -> Router<AppState> {
    Router::new().route("/sessions", post(create_checkout_session))
}

/// Complete API router, suitable for mounting at the server root.
///
/// # Routes
/// - `POST /api/webhooks/stripe`
/// - `POST /api/checkout/sessions`
/// - `GET /health`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/checkout", checkout_routes())
        .route("/health", get(health))
}
