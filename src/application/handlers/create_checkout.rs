//! CreateCheckoutHandler - command handler for opening checkout sessions.
//!
//! Validates client input before any provider call: a request that fails
//! validation never leaves the process.

use std::sync::Arc;

use crate::config::PaymentConfig;
use crate::domain::billing::CheckoutError;
use crate::domain::foundation::Timestamp;
use crate::ports::{CheckoutGateway, CheckoutMode, CreateSessionRequest, SessionHandle};

/// Command to open a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    /// Provider price reference selected by the client.
    pub price_id: String,

    /// Customer email address.
    pub email: String,

    /// Requested mode string; defaults to subscription when absent.
    pub mode: Option<String>,
}

/// Handler for creating provider checkout sessions.
pub struct CreateCheckoutHandler {
    gateway: Arc<dyn CheckoutGateway>,
    success_url: String,
    cancel_url: String,
}

impl CreateCheckoutHandler {
    pub fn new(gateway: Arc<dyn CheckoutGateway>, payment: &PaymentConfig) -> Self {
        Self {
            gateway,
            success_url: payment.success_url(),
            cancel_url: payment.cancel_url(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutCommand,
    ) -> Result<SessionHandle, CheckoutError> {
        if cmd.price_id.is_empty() {
            return Err(CheckoutError::Validation {
                field: "priceId",
                message: "Missing priceId",
            });
        }

        if cmd.email.is_empty() {
            return Err(CheckoutError::Validation {
                field: "email",
                message: "Missing email",
            });
        }

        if !email_shape_is_valid(&cmd.email) {
            return Err(CheckoutError::Validation {
                field: "email",
                message: "Invalid email",
            });
        }

        let mode = match cmd.mode.as_deref() {
            None | Some("") => CheckoutMode::default(),
            Some(value) => CheckoutMode::parse(value).ok_or(CheckoutError::Validation {
                field: "mode",
                message: "Invalid mode",
            })?,
        };

        let request = CreateSessionRequest {
            price_id: cmd.price_id,
            customer_email: cmd.email,
            mode,
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            created_at: Timestamp::now().to_string(),
        };

        let session = self.gateway.create_session(request).await.map_err(|e| {
            match &e {
                CheckoutError::Rejected(detail) => {
                    tracing::warn!(error = %detail, "Provider rejected checkout request")
                }
                _ => tracing::error!(error = %e, "Checkout session creation failed"),
            }
            e
        })?;

        tracing::info!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }
}

/// Conservative email shape check: exactly one `@`, non-empty local and
/// domain parts, at least one `.` in the domain. Shape only, not
/// deliverability.
fn email_shape_is_valid(email: &str) -> bool {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.contains(char::is_whitespace) {
        return false;
    }

    // The domain needs a dot separating non-empty labels
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
