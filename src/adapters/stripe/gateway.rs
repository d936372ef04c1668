//! Stripe checkout gateway adapter.
//!
//! Implements the `CheckoutGateway` port over the Stripe REST API using
//! form-encoded requests with basic auth, the way Stripe's API expects.
//! Provider rejections are distinguished from transport failures so the
//! caller can tell user-correctable input from retryable trouble.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::CheckoutError;
use crate::ports::{CheckoutGateway, CreateSessionRequest, SessionHandle};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Checkout gateway backed by the Stripe API.
pub struct StripeCheckoutGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeCheckoutGateway {
    /// Create a new gateway with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

/// Stripe checkout session response (fields we use).
#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

/// Stripe error envelope.
#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

/// Classifies a non-success Stripe response.
///
/// An `invalid_request_error` on a 4xx means the request itself was bad
/// (unknown price, malformed parameter) - user-correctable. Anything else
/// is treated as a provider failure the caller may retry.
fn classify_error_response(status: reqwest::StatusCode, body: &str) -> CheckoutError {
    let parsed: Option<StripeErrorEnvelope> = serde_json::from_str(body).ok();
    let (error_type, message) = parsed
        .map(|e| (e.error.error_type, e.error.message))
        .unwrap_or((None, None));

    let detail = message.unwrap_or_else(|| format!("Stripe API error (status {})", status));

    if status.is_client_error() && error_type.as_deref() == Some("invalid_request_error") {
        CheckoutError::Rejected(detail)
    } else {
        CheckoutError::Provider(detail)
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutGateway {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionHandle, CheckoutError> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);

        let params = [
            ("mode", request.mode.as_str().to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price]", request.price_id),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", request.customer_email.clone()),
            ("success_url", request.success_url),
            ("cancel_url", request.cancel_url),
            ("metadata[email]", request.customer_email),
            ("metadata[created_at]", request.created_at),
        ];

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| CheckoutError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %error_text, "Stripe session creation failed");
            return Err(classify_error_response(status, &error_text));
        }

        let session: StripeSession = response.json().await.map_err(|e| {
            CheckoutError::Provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        Ok(SessionHandle {
            id: session.id,
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ══════════════════════════════════════════════════════════════
    // Configuration Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn config_defaults_to_stripe_api() {
        let config = StripeConfig::new("sk_test_key");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
    }

    #[test]
    fn config_with_base_url() {
        let config = StripeConfig::new("sk_test_key").with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    // ══════════════════════════════════════════════════════════════
    // Error Classification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_request_error_classifies_as_rejected() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"No such price: 'price_zzz'"}}"#;
        let err = classify_error_response(reqwest::StatusCode::BAD_REQUEST, body);

        match err {
            CheckoutError::Rejected(detail) => {
                assert!(detail.contains("No such price"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn api_error_classifies_as_provider_failure() {
        let body = r#"{"error":{"type":"api_error","message":"Something went wrong"}}"#;
        let err = classify_error_response(reqwest::StatusCode::INTERNAL_SERVER_ERROR, body);

        assert!(matches!(err, CheckoutError::Provider(_)));
    }

    #[test]
    fn rate_limit_classifies_as_provider_failure() {
        // 429 is a client-error status but not invalid input; retryable
        let body = r#"{"error":{"type":"rate_limit_error","message":"Too many requests"}}"#;
        let err = classify_error_response(reqwest::StatusCode::TOO_MANY_REQUESTS, body);

        assert!(matches!(err, CheckoutError::Provider(_)));
    }

    #[test]
    fn unparsable_error_body_classifies_as_provider_failure() {
        let err = classify_error_response(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");

        match err {
            CheckoutError::Provider(detail) => assert!(detail.contains("502")),
            other => panic!("expected Provider, got {:?}", other),
        }
    }

    #[test]
    fn session_response_parses_with_url() {
        let body = r#"{"id":"cs_test_1","url":"https://checkout.stripe.com/c/pay/cs_test_1","object":"checkout.session"}"#;
        let session: StripeSession = serde_json::from_str(body).unwrap();

        assert_eq!(session.id, "cs_test_1");
        assert_eq!(
            session.url.as_deref(),
            Some("https://checkout.stripe.com/c/pay/cs_test_1")
        );
    }
}
