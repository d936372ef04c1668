//! Durable record types owned by the external store.
//!
//! This service never creates the storage schema for these records; it
//! issues conditional updates against them through the store ports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::Timestamp;

/// Payment standing of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No successful payment recorded.
    Unpaid,

    /// Payment completed; access granted.
    Paid,

    /// A charge failed; grace period applies.
    PastDue,

    /// Subscription canceled; access revoked.
    Canceled,
}

impl PaymentStatus {
    /// Returns true if this status grants access to paid features.
    pub fn has_access(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::PastDue)
    }

    /// Storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::PastDue => "past_due",
            PaymentStatus::Canceled => "canceled",
        }
    }

    /// Parses a storage representation back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(PaymentStatus::Unpaid),
            "paid" => Some(PaymentStatus::Paid),
            "past_due" => Some(PaymentStatus::PastDue),
            "canceled" => Some(PaymentStatus::Canceled),
            _ => None,
        }
    }
}

/// Account record joined to the provider by `identity` (email).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Stable external key joining provider and application identity.
    pub identity: String,

    /// Provider's customer reference; set on first successful payment.
    pub provider_customer_id: Option<String>,

    /// Current payment standing.
    pub payment_status: PaymentStatus,

    /// When the account was last marked paid.
    pub paid_at: Option<Timestamp>,

    /// Amount of the completing payment, in minor units (cents).
    pub amount_paid_minor: Option<i64>,
}

impl AccountRecord {
    /// Creates an unpaid account record for the given identity.
    pub fn unpaid(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            provider_customer_id: None,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            amount_paid_minor: None,
        }
    }

    /// True when a payment completed at `occurred_at` would be stale for
    /// this record: already paid with an equal-or-later `paid_at`.
    pub fn supersedes_payment_at(&self, occurred_at: Timestamp) -> bool {
        self.payment_status == PaymentStatus::Paid
            && self.paid_at.map(|t| t >= occurred_at).unwrap_or(false)
    }
}

/// Provider-reported subscription status, constrained to the known set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active and current.
    Active,

    /// Subscription is in trial period.
    Trialing,

    /// Payment is past due, grace period active.
    PastDue,

    /// Subscription is canceled. Terminal.
    Canceled,

    /// Payment retries exhausted without success.
    Unpaid,

    /// Initial payment incomplete.
    Incomplete,

    /// Initial payment window expired.
    IncompleteExpired,

    /// Subscription is paused.
    Paused,

    /// Status string not in the known set.
    Unknown,
}

impl SubscriptionStatus {
    /// Parse a provider status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// Storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for statuses counted as "active" for the
    /// one-active-subscription-per-identity invariant.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active | Self::Trialing | Self::PastDue)
    }

    /// Returns true for terminal statuses that later updates must not
    /// overwrite.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Canceled | Self::IncompleteExpired)
    }
}

/// Subscription record keyed by `(identity, provider_subscription_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Join key to the account record.
    pub identity: String,

    /// Provider's subscription id, unique per subscription lifecycle.
    pub provider_subscription_id: String,

    /// Provider-reported status.
    pub status: SubscriptionStatus,

    /// End of the current billing period. Monotonically non-decreasing
    /// across updates for the same subscription id, except cancellation.
    pub current_period_end: Timestamp,
}

impl SubscriptionRecord {
    /// True when an update carrying `period_end` must not overwrite this
    /// record: the stored state is terminal, or strictly newer.
    pub fn supersedes_update_at(&self, period_end: Timestamp) -> bool {
        self.status.is_terminal() || self.current_period_end > period_end
    }
}

/// Append-only log entry for a failed charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFailureRecord {
    /// Log entry id.
    pub id: Uuid,

    /// Account identity the charge belonged to.
    pub identity: String,

    /// Provider's charge id; duplicate deliveries deduplicate on it.
    pub provider_charge_id: String,

    /// Provider's failure message, when present.
    pub reason: Option<String>,

    /// When the charge failed.
    pub failed_at: Timestamp,
}

impl PaymentFailureRecord {
    /// Creates a new failure log entry with a fresh id.
    pub fn new(
        identity: impl Into<String>,
        provider_charge_id: impl Into<String>,
        reason: Option<String>,
        failed_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            provider_charge_id: provider_charge_id.into(),
            reason,
            failed_at,
        }
    }
}
