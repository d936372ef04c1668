//! Reconciler - applies classified transitions to the record stores.
//!
//! One operation per transition kind, each idempotent under at-least-once
//! delivery. Ordering safety comes from the conditional writes behind the
//! store ports; this layer performs no internal retries, because only the
//! provider's redelivery mechanism makes retries safe.

use std::sync::Arc;

use crate::domain::billing::{
    PaymentFailureRecord, SubscriptionRecord, SubscriptionStatus, Transition, WebhookError,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{AccountStore, FailureLog, StoreError, SubscriptionStore, WriteOutcome};

/// Result of applying a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The store state changed.
    Applied,

    /// The store already superseded this event (duplicate or stale
    /// delivery). Acknowledged as success.
    Unchanged,
}

/// Applies transitions to account, subscription, and failure-log records.
pub struct Reconciler {
    accounts: Arc<dyn AccountStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    failures: Arc<dyn FailureLog>,
}

impl Reconciler {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        failures: Arc<dyn FailureLog>,
    ) -> Self {
        Self {
            accounts,
            subscriptions,
            failures,
        }
    }

    /// Applies a classified transition.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Store` when a store write fails; the caller
    /// acknowledges with a retryable status and the provider redelivers.
    pub async fn apply(&self, transition: &Transition) -> Result<ReconcileOutcome, WebhookError> {
        match transition {
            Transition::PaymentCompleted {
                identity,
                provider_customer_id,
                amount_minor,
                occurred_at,
            } => {
                self.apply_payment_completed(
                    identity,
                    provider_customer_id,
                    *amount_minor,
                    *occurred_at,
                )
                .await
            }

            Transition::SubscriptionUpdated {
                identity,
                subscription_id,
                status,
                current_period_end,
            } => {
                self.apply_subscription_updated(
                    identity,
                    subscription_id,
                    *status,
                    *current_period_end,
                )
                .await
            }

            Transition::SubscriptionCanceled {
                identity,
                subscription_id,
            } => self.apply_subscription_canceled(identity, subscription_id).await,

            Transition::ChargeFailed {
                identity,
                charge_id,
                reason,
                occurred_at,
            } => {
                self.apply_charge_failed(identity, charge_id, reason.clone(), *occurred_at)
                    .await
            }

            // The dispatcher acknowledges unrecognized events before
            // reaching this layer.
            Transition::Unrecognized { declared_type } => {
                tracing::debug!(declared_type = %declared_type, "No reconciliation for event type");
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }

    /// Marks the account paid, unless a later payment already did.
    pub async fn apply_payment_completed(
        &self,
        identity: &str,
        provider_customer_id: &str,
        amount_minor: Option<i64>,
        occurred_at: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let outcome = self
            .accounts
            .mark_paid(identity, provider_customer_id, amount_minor, occurred_at)
            .await
            .map_err(store_failure)?;

        match outcome {
            WriteOutcome::Applied => {
                tracing::info!(identity = %identity, "Account marked paid");
                Ok(ReconcileOutcome::Applied)
            }
            WriteOutcome::Unchanged => {
                tracing::debug!(identity = %identity, "Payment already recorded, skipping");
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }

    /// Upserts the subscription record, guarded against stale periods and
    /// terminal states.
    pub async fn apply_subscription_updated(
        &self,
        identity: &str,
        subscription_id: &str,
        status: SubscriptionStatus,
        current_period_end: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let record = SubscriptionRecord {
            identity: identity.to_string(),
            provider_subscription_id: subscription_id.to_string(),
            status,
            current_period_end,
        };

        let outcome = self
            .subscriptions
            .upsert_if_newer(&record)
            .await
            .map_err(store_failure)?;

        match outcome {
            WriteOutcome::Applied => {
                tracing::info!(
                    subscription_id = %subscription_id,
                    status = %status.as_str(),
                    "Subscription updated"
                );
                Ok(ReconcileOutcome::Applied)
            }
            WriteOutcome::Unchanged => {
                tracing::debug!(
                    subscription_id = %subscription_id,
                    "Stale subscription update, keeping stored state"
                );
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }

    /// Marks the subscription canceled and revokes account access.
    ///
    /// The subscription write is the primary one; the access revoke is a
    /// best-effort secondary, and a failure there is logged rather than
    /// surfaced (the cancel is terminal and redelivery converges it).
    pub async fn apply_subscription_canceled(
        &self,
        identity: &str,
        subscription_id: &str,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let outcome = self
            .subscriptions
            .mark_canceled(identity, subscription_id)
            .await
            .map_err(store_failure)?;

        if let Err(e) = self.accounts.revoke_access(identity).await {
            tracing::warn!(
                identity = %identity,
                error = %e,
                "Access revoke failed after subscription cancel"
            );
        }

        tracing::info!(subscription_id = %subscription_id, "Subscription canceled");
        Ok(match outcome {
            WriteOutcome::Applied => ReconcileOutcome::Applied,
            WriteOutcome::Unchanged => ReconcileOutcome::Unchanged,
        })
    }

    /// Appends a failure-log entry, deduplicated by charge id.
    pub async fn apply_charge_failed(
        &self,
        identity: &str,
        charge_id: &str,
        reason: Option<String>,
        occurred_at: Timestamp,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let record = PaymentFailureRecord::new(identity, charge_id, reason, occurred_at);

        let outcome = self.failures.append(&record).await.map_err(store_failure)?;

        match outcome {
            WriteOutcome::Applied => {
                tracing::info!(charge_id = %charge_id, "Payment failure logged");
                Ok(ReconcileOutcome::Applied)
            }
            WriteOutcome::Unchanged => {
                tracing::debug!(charge_id = %charge_id, "Duplicate charge failure, skipping");
                Ok(ReconcileOutcome::Unchanged)
            }
        }
    }
}

fn store_failure(err: StoreError) -> WebhookError {
    tracing::error!(error = %err, "Store write failed during reconciliation");
    WebhookError::Store(err.to_string())
}
