//! Event classification into the closed transition set.
//!
//! Maps a verified provider event onto one of a fixed set of semantic
//! transitions. New provider event types are explicit additions here,
//! never an open-ended string dispatch. Unknown types classify as
//! `Unrecognized` and are acknowledged without mutation; a known type
//! with a missing required field is a malformed-event error instead.

use serde_json::Value;

use super::errors::WebhookError;
use super::event::ProviderEvent;
use super::records::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

/// Semantic transition carried by a verified event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A checkout completed; the account becomes paid.
    PaymentCompleted {
        identity: String,
        provider_customer_id: String,
        amount_minor: Option<i64>,
        occurred_at: Timestamp,
    },

    /// A subscription renewed or changed.
    SubscriptionUpdated {
        identity: String,
        subscription_id: String,
        status: SubscriptionStatus,
        current_period_end: Timestamp,
    },

    /// A subscription ended; access is revoked. Terminal.
    SubscriptionCanceled {
        identity: String,
        subscription_id: String,
    },

    /// A charge failed; logged for follow-up.
    ChargeFailed {
        identity: String,
        charge_id: String,
        reason: Option<String>,
        occurred_at: Timestamp,
    },

    /// Declared type outside the handled set. Acknowledged, no mutation.
    Unrecognized { declared_type: String },
}

impl Transition {
    /// Classifies a verified event into the transition set.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`/`MissingMetadata` when a known event type
    /// lacks a required field. Unknown types are not an error.
    pub fn classify(event: &ProviderEvent) -> Result<Transition, WebhookError> {
        let object = &event.data.object;

        match event.event_type.as_str() {
            "checkout.session.completed" => Ok(Transition::PaymentCompleted {
                identity: require_str(object, "customer_email")?,
                provider_customer_id: require_str(object, "customer")?,
                amount_minor: object.get("amount_total").and_then(Value::as_i64),
                occurred_at: Timestamp::from_unix_secs(event.created),
            }),

            "customer.subscription.updated" => Ok(Transition::SubscriptionUpdated {
                identity: require_metadata_email(object)?,
                subscription_id: require_str(object, "id")?,
                status: SubscriptionStatus::parse(&require_str(object, "status")?),
                current_period_end: Timestamp::from_unix_secs(require_i64(
                    object,
                    "current_period_end",
                )?),
            }),

            "customer.subscription.deleted" => Ok(Transition::SubscriptionCanceled {
                identity: require_metadata_email(object)?,
                subscription_id: require_str(object, "id")?,
            }),

            "charge.failed" => Ok(Transition::ChargeFailed {
                identity: require_metadata_email(object)?,
                charge_id: require_str(object, "id")?,
                reason: object
                    .get("failure_message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                occurred_at: Timestamp::from_unix_secs(event.created),
            }),

            other => Ok(Transition::Unrecognized {
                declared_type: other.to_string(),
            }),
        }
    }

    /// Short name used in logs and acknowledgment bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Transition::PaymentCompleted { .. } => "payment_completed",
            Transition::SubscriptionUpdated { .. } => "subscription_updated",
            Transition::SubscriptionCanceled { .. } => "subscription_canceled",
            Transition::ChargeFailed { .. } => "charge_failed",
            Transition::Unrecognized { .. } => "unrecognized",
        }
    }
}

fn require_str(object: &Value, field: &'static str) -> Result<String, WebhookError> {
    object
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(WebhookError::MissingField(field))
}

fn require_i64(object: &Value, field: &'static str) -> Result<i64, WebhookError> {
    object
        .get(field)
        .and_then(Value::as_i64)
        .ok_or(WebhookError::MissingField(field))
}

/// Subscription and charge objects carry the account identity in their
/// metadata, stamped there at checkout-session creation.
fn require_metadata_email(object: &Value) -> Result<String, WebhookError> {
    object
        .get("metadata")
        .and_then(|m| m.get("email"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(WebhookError::MissingMetadata("email"))
}
