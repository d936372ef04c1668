//! Error types for webhook processing and checkout session creation.
//!
//! The webhook taxonomy maps onto HTTP acknowledgment classes: the payment
//! provider keys its redelivery behavior off the status code, so the
//! distinction between client-error (never retried) and server-error
//! (redelivered later) is part of the contract, not presentation.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur while processing an inbound webhook delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header was absent from the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Computed digest matched none of the signatures in the header.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the tolerance window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Signed timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or the JSON payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from the event object.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Required metadata entry missing from the event object.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Test-mode event delivered while live mode is required.
    #[error("Test mode event rejected")]
    LivemodeRequired,

    /// A store write failed; the delivery must be retried by the provider.
    #[error("Store error: {0}")]
    Store(String),

    /// Processing exceeded the configured bound; fail closed.
    #[error("Processing timed out")]
    Timeout,
}

impl WebhookError {
    /// Returns true if the provider should redeliver this event.
    ///
    /// Retryable errors are temporary: store connectivity, conflicts under
    /// concurrent writes, or a processing timeout. Authentication and shape
    /// problems never become valid by retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_) | WebhookError::Timeout)
    }

    /// Maps the error to the HTTP status the delivery is acknowledged with.
    ///
    /// - 4xx: client error, the provider stops retrying
    /// - 5xx: server error, the provider redelivers later
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authentication failures
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange => StatusCode::UNAUTHORIZED,

            // Shape problems on an authenticated payload
            WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::LivemodeRequired => StatusCode::BAD_REQUEST,

            // Retryable processing failures
            WebhookError::Store(_) | WebhookError::Timeout => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors that occur while creating a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A request field failed validation; no provider call was made.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },

    /// The provider judged the request invalid (e.g. unknown price).
    /// User-correctable; retrying the same input will not help.
    #[error("Invalid payment parameters: {0}")]
    Rejected(String),

    /// Provider or transport failure; safe for the caller to retry.
    #[error("Payment provider error: {0}")]
    Provider(String),
}

impl CheckoutError {
    /// Maps the error to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckoutError::Validation { .. } | CheckoutError::Rejected(_) => {
                StatusCode::BAD_REQUEST
            }
            CheckoutError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true when the failure is transient infrastructure trouble.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Provider(_))
    }
}
