//! HTTP handlers connecting axum routes to the application handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    CreateCheckoutCommand, CreateCheckoutHandler, ProcessWebhookCommand, ProcessWebhookHandler,
    Reconciler,
};
use crate::config::{Environment, PaymentConfig};
use crate::domain::billing::{CheckoutError, WebhookError, WebhookVerifier};
use crate::ports::{AccountStore, CheckoutGateway, FailureLog, SubscriptionStore};

use super::dto::{
    CheckoutSessionResponse, CreateCheckoutSessionRequest, ErrorResponse, WebhookAck,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped, constructed once at
/// process start. There is no other shared mutable state between
/// concurrent requests.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub subscriptions: Arc<dyn SubscriptionStore>,
    pub failures: Arc<dyn FailureLog>,
    pub checkout_gateway: Arc<dyn CheckoutGateway>,
    pub payment: PaymentConfig,
    pub environment: Environment,
    pub processing_timeout: Duration,
}

impl AppState {
    /// Create handlers on demand from the shared state.
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        let verifier = WebhookVerifier::new(self.payment.stripe_webhook_secret.clone())
            .with_tolerance_secs(self.payment.signature_tolerance_secs as i64);
        let reconciler = Reconciler::new(
            self.accounts.clone(),
            self.subscriptions.clone(),
            self.failures.clone(),
        );
        ProcessWebhookHandler::new(verifier, reconciler)
            .with_require_livemode(self.payment.require_livemode)
    }

    pub fn checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.checkout_gateway.clone(), &self.payment)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health - liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /api/webhooks/stripe - process a provider webhook delivery
///
/// The body is consumed as raw bytes: the signature covers the exact
/// delivered payload, never a re-serialized form.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookApiError(WebhookError::MissingSignature))?;

    let handler = state.webhook_handler();
    let cmd = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    // Fail closed on slow processing: the provider redelivers, and the
    // conditional writes make the redelivery safe.
    let outcome = tokio::time::timeout(state.processing_timeout, handler.handle(cmd))
        .await
        .map_err(|_| {
            tracing::error!("Webhook processing exceeded timeout");
            WebhookApiError(WebhookError::Timeout)
        })??;

    tracing::debug!(outcome = ?outcome, "Webhook acknowledged");
    Ok((StatusCode::OK, Json(WebhookAck::ok())))
}

/// POST /api/checkout/sessions - open a provider checkout session
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutSessionRequest>,
) -> Result<impl IntoResponse, CheckoutApiError> {
    let handler = state.checkout_handler();
    let cmd = CreateCheckoutCommand {
        price_id: request.price_id,
        email: request.email,
        mode: request.mode,
    };

    let session = handler
        .handle(cmd)
        .await
        .map_err(|e| CheckoutApiError::new(e, state.environment))?;

    let response = CheckoutSessionResponse {
        session_id: session.id,
        url: session.url,
    };

    Ok((StatusCode::OK, Json(response)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Maps webhook errors to the acknowledgment the provider keys retries on.
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = ErrorResponse::new(self.0.to_string());
        (status, Json(body)).into_response()
    }
}

/// Maps checkout errors to client responses, with diagnostic detail
/// included only outside production.
pub struct CheckoutApiError {
    error: CheckoutError,
    environment: Environment,
}

impl CheckoutApiError {
    pub fn new(error: CheckoutError, environment: Environment) -> Self {
        Self { error, environment }
    }
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.error.status_code();
        let body = match &self.error {
            CheckoutError::Validation { message, .. } => ErrorResponse::new(*message),
            CheckoutError::Rejected(detail) => {
                ErrorResponse::new("Invalid payment parameters").with_details(detail.clone())
            }
            CheckoutError::Provider(detail) => {
                let body = ErrorResponse::new("Failed to create checkout session");
                if self.environment == Environment::Production {
                    body
                } else {
                    body.with_message(detail.clone())
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
