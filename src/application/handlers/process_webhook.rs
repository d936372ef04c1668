//! ProcessWebhookHandler - command handler for inbound provider webhooks.
//!
//! One pass per delivery: verify the signature, classify the event, apply
//! the transition. Verification and classification failures never reach
//! the stores. Deliveries are independent; nothing is shared between
//! concurrent invocations except the external store behind the
//! conditional-write ports.

use std::sync::Arc;

use crate::domain::billing::{Transition, WebhookError, WebhookVerifier};

use super::reconcile::{ReconcileOutcome, Reconciler};

/// Command to process one webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Exact request body bytes the signature was computed over.
    pub payload: Vec<u8>,

    /// Value of the signature header.
    pub signature: String,
}

/// Result of processing a webhook delivery. All variants acknowledge with
/// success; failures are `WebhookError`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The transition was applied to the store.
    Applied { kind: &'static str },

    /// The store already superseded this delivery (duplicate/stale).
    Unchanged { kind: &'static str },

    /// Declared type outside the handled set; deliberately ignored.
    /// Still a success acknowledgment so the provider stops retrying.
    Ignored { declared_type: String },
}

/// Handler for processing provider webhooks.
pub struct ProcessWebhookHandler {
    verifier: WebhookVerifier,
    reconciler: Reconciler,
    require_livemode: bool,
}

impl ProcessWebhookHandler {
    pub fn new(verifier: WebhookVerifier, reconciler: Reconciler) -> Self {
        Self {
            verifier,
            reconciler,
            require_livemode: false,
        }
    }

    /// Rejects test-mode events when enabled (production setting).
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookOutcome, WebhookError> {
        // 1. Authenticate the payload
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, &cmd.signature)
            .inspect_err(|e| {
                tracing::warn!(error = %e, "Webhook signature verification failed");
            })?;

        if self.require_livemode && !event.is_live() {
            tracing::warn!(event_id = %event.id, "Rejected test mode event");
            return Err(WebhookError::LivemodeRequired);
        }

        // 2. Classify into the closed transition set
        let transition = Transition::classify(&event).inspect_err(|e| {
            tracing::warn!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Malformed event"
            );
        })?;

        // 3. Deliberately ignored types acknowledge without mutation
        if let Transition::Unrecognized { declared_type } = transition {
            tracing::info!(
                event_id = %event.id,
                declared_type = %declared_type,
                "Unhandled event type acknowledged"
            );
            return Ok(WebhookOutcome::Ignored { declared_type });
        }

        // 4. Apply the transition
        let kind = transition.kind();
        match self.reconciler.apply(&transition).await? {
            ReconcileOutcome::Applied => {
                tracing::info!(event_id = %event.id, kind = %kind, "Event reconciled");
                Ok(WebhookOutcome::Applied { kind })
            }
            ReconcileOutcome::Unchanged => {
                tracing::info!(event_id = %event.id, kind = %kind, "Event already reconciled");
                Ok(WebhookOutcome::Unchanged { kind })
            }
        }
    }
}
