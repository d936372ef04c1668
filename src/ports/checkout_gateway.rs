//! Checkout gateway port for the payment provider boundary.
//!
//! Defines the contract for opening provider-hosted checkout sessions.
//! The implementation talks to the provider's API; this port carries only
//! validated input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::billing::CheckoutError;

/// Checkout mode: the closed set of purchase shapes we open sessions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    /// One-time purchase.
    Payment,

    /// Recurring subscription (the default).
    Subscription,
}

impl CheckoutMode {
    /// Wire value sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }

    /// Parses a client-supplied mode string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment" => Some(CheckoutMode::Payment),
            "subscription" => Some(CheckoutMode::Subscription),
            _ => None,
        }
    }
}

impl Default for CheckoutMode {
    fn default() -> Self {
        CheckoutMode::Subscription
    }
}

/// Validated request to open a checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSessionRequest {
    /// Provider price reference for the line item.
    pub price_id: String,

    /// Customer email, pre-filled on the provider's page and stamped into
    /// session metadata so webhook events can be joined back.
    pub customer_email: String,

    /// Purchase shape.
    pub mode: CheckoutMode,

    /// Redirect target after successful payment.
    pub success_url: String,

    /// Redirect target after abandoning checkout.
    pub cancel_url: String,

    /// Session creation time, stamped into metadata.
    pub created_at: String,
}

/// Provider-issued session handle returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHandle {
    /// Provider's session identifier.
    pub id: String,

    /// Hosted checkout URL for the customer.
    pub url: String,
}

/// Port for opening checkout sessions at the payment provider.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Opens a checkout session and returns its handle.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::Rejected` - the provider judged the request
    ///   invalid (e.g. unknown price reference)
    /// - `CheckoutError::Provider` - transport or backend failure
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionHandle, CheckoutError>;
}
