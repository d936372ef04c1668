//! Store ports for account, subscription, and failure-log records.
//!
//! The records live in an external store; these contracts expose only
//! conditional writes keyed by identity and/or subscription id. Safety
//! under concurrent and re-delivered events comes from the guard
//! condition inside each write, never from application-level locks.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::{PaymentFailureRecord, SubscriptionRecord};
use crate::domain::foundation::Timestamp;

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The guard held and the record was written.
    Applied,

    /// The guard rejected the write; stored state already supersedes it.
    /// Not an error: re-delivered and out-of-order events land here.
    Unchanged,
}

/// Failures reported by the store boundary.
///
/// The three cases are deliberately distinguishable: callers choose
/// acknowledgment behavior from the kind, not the message.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The keyed record does not exist.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A constraint rejected the write (e.g. uniqueness violation).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Connectivity or protocol failure talking to the store.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Conditional updates against account records, keyed by identity.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Marks the account paid with the given provider customer id, amount,
    /// and payment time.
    ///
    /// The write only lands when the account is not already paid with an
    /// equal-or-later `paid_at`; otherwise returns `Unchanged`. Safe to
    /// re-apply with identical arguments.
    async fn mark_paid(
        &self,
        identity: &str,
        provider_customer_id: &str,
        amount_minor: Option<i64>,
        paid_at: Timestamp,
    ) -> Result<WriteOutcome, StoreError>;

    /// Revokes paid access for the account (cancellation path).
    ///
    /// Unconditional with respect to ordering: cancellation is terminal.
    async fn revoke_access(&self, identity: &str) -> Result<WriteOutcome, StoreError>;
}

/// Conditional upserts against subscription records, keyed by
/// `(identity, provider_subscription_id)`.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Inserts the record, or overwrites the stored one only when the
    /// incoming `current_period_end` is equal-or-later and the stored
    /// status is not terminal. Returns `Unchanged` when the guard rejects
    /// a stale or post-cancellation update.
    async fn upsert_if_newer(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<WriteOutcome, StoreError>;

    /// Marks the subscription canceled regardless of stored state.
    /// Terminal: always wins over prior non-terminal states.
    async fn mark_canceled(
        &self,
        identity: &str,
        subscription_id: &str,
    ) -> Result<WriteOutcome, StoreError>;
}

/// Append-only log of failed charges.
#[async_trait]
pub trait FailureLog: Send + Sync {
    /// Appends a failure record. A second delivery carrying the same
    /// `provider_charge_id` returns `Unchanged`, not an error.
    async fn append(&self, record: &PaymentFailureRecord) -> Result<WriteOutcome, StoreError>;
}
