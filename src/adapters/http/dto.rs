//! Request/response DTOs for the HTTP API.
//!
//! Wire names are camelCase to match the client the original API served.

use serde::{Deserialize, Serialize};

/// POST /api/checkout/sessions request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    /// Provider price reference.
    #[serde(default)]
    pub price_id: String,

    /// Customer email address.
    #[serde(default)]
    pub email: String,

    /// Checkout mode; defaults to subscription when absent.
    #[serde(default)]
    pub mode: Option<String>,
}

/// POST /api/checkout/sessions success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    /// Provider's session identifier.
    pub session_id: String,

    /// Hosted checkout URL to redirect the customer to.
    pub url: String,
}

/// Webhook success acknowledgment body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    /// Always true; the provider only checks the status code.
    pub received: bool,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { received: true }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short error description.
    pub error: String,

    /// Field-level or provider detail, when user-correctable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Diagnostic message; omitted in production.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            message: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
