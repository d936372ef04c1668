//! In-memory store implementations.
//!
//! Implement the store ports with the same guard semantics as the
//! PostgreSQL adapters. Used by tests and local development; no
//! persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{
    AccountRecord, PaymentFailureRecord, PaymentStatus, SubscriptionRecord, SubscriptionStatus,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{AccountStore, FailureLog, StoreError, SubscriptionStore, WriteOutcome};

/// In-memory account store keyed by identity.
pub struct InMemoryAccountStore {
    accounts: Mutex<HashMap<String, AccountRecord>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    /// Seeds an unpaid account for the given identity.
    pub fn with_account(identity: impl Into<String>) -> Self {
        let store = Self::new();
        let identity = identity.into();
        store
            .accounts
            .lock()
            .unwrap()
            .insert(identity.clone(), AccountRecord::unpaid(identity));
        store
    }

    /// Inserts a record as-is.
    pub fn insert(&self, record: AccountRecord) {
        self.accounts
            .lock()
            .unwrap()
            .insert(record.identity.clone(), record);
    }

    /// Returns a snapshot of the record for the identity.
    pub fn get(&self, identity: &str) -> Option<AccountRecord> {
        self.accounts.lock().unwrap().get(identity).cloned()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn mark_paid(
        &self,
        identity: &str,
        provider_customer_id: &str,
        amount_minor: Option<i64>,
        paid_at: Timestamp,
    ) -> Result<WriteOutcome, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        let record = accounts
            .get_mut(identity)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", identity)))?;

        if record.supersedes_payment_at(paid_at) {
            return Ok(WriteOutcome::Unchanged);
        }

        record.payment_status = PaymentStatus::Paid;
        record.provider_customer_id = Some(provider_customer_id.to_string());
        record.paid_at = Some(paid_at);
        record.amount_paid_minor = amount_minor;
        Ok(WriteOutcome::Applied)
    }

    async fn revoke_access(&self, identity: &str) -> Result<WriteOutcome, StoreError> {
        let mut accounts = self.accounts.lock().unwrap();
        let record = accounts
            .get_mut(identity)
            .ok_or_else(|| StoreError::NotFound(format!("account {}", identity)))?;

        if record.payment_status == PaymentStatus::Canceled {
            return Ok(WriteOutcome::Unchanged);
        }

        record.payment_status = PaymentStatus::Canceled;
        Ok(WriteOutcome::Applied)
    }
}

/// In-memory subscription store keyed by (identity, subscription id).
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<HashMap<(String, String), SubscriptionRecord>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a snapshot of the record for the key.
    pub fn get(&self, identity: &str, subscription_id: &str) -> Option<SubscriptionRecord> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(&(identity.to_string(), subscription_id.to_string()))
            .cloned()
    }

    /// True when no subscription records exist.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.lock().unwrap().is_empty()
    }
}

impl Default for InMemorySubscriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn upsert_if_newer(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<WriteOutcome, StoreError> {
        let key = (
            record.identity.clone(),
            record.provider_subscription_id.clone(),
        );
        let mut subscriptions = self.subscriptions.lock().unwrap();

        if let Some(existing) = subscriptions.get(&key) {
            if existing.supersedes_update_at(record.current_period_end) {
                return Ok(WriteOutcome::Unchanged);
            }
        }

        subscriptions.insert(key, record.clone());
        Ok(WriteOutcome::Applied)
    }

    async fn mark_canceled(
        &self,
        identity: &str,
        subscription_id: &str,
    ) -> Result<WriteOutcome, StoreError> {
        let key = (identity.to_string(), subscription_id.to_string());
        let mut subscriptions = self.subscriptions.lock().unwrap();

        match subscriptions.get_mut(&key) {
            Some(existing) if existing.status == SubscriptionStatus::Canceled => {
                Ok(WriteOutcome::Unchanged)
            }
            Some(existing) => {
                existing.status = SubscriptionStatus::Canceled;
                Ok(WriteOutcome::Applied)
            }
            None => {
                // Cancellation may arrive before any update; record the
                // terminal state so later stale updates cannot resurrect it.
                subscriptions.insert(
                    key,
                    SubscriptionRecord {
                        identity: identity.to_string(),
                        provider_subscription_id: subscription_id.to_string(),
                        status: SubscriptionStatus::Canceled,
                        current_period_end: Timestamp::now(),
                    },
                );
                Ok(WriteOutcome::Applied)
            }
        }
    }
}

/// In-memory append-only failure log, deduplicated by charge id.
pub struct InMemoryFailureLog {
    entries: Mutex<Vec<PaymentFailureRecord>>,
}

impl InMemoryFailureLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all log entries.
    pub fn entries(&self) -> Vec<PaymentFailureRecord> {
        self.entries.lock().unwrap().clone()
    }
}

impl Default for InMemoryFailureLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FailureLog for InMemoryFailureLog {
    async fn append(&self, record: &PaymentFailureRecord) -> Result<WriteOutcome, StoreError> {
        let mut entries = self.entries.lock().unwrap();

        if entries
            .iter()
            .any(|e| e.provider_charge_id == record.provider_charge_id)
        {
            return Ok(WriteOutcome::Unchanged);
        }

        entries.push(record.clone());
        Ok(WriteOutcome::Applied)
    }
}

/// Account store that fails every call. For error-path tests.
pub struct FailingAccountStore {
    error: fn() -> StoreError,
}

impl FailingAccountStore {
    /// Fails with a transport error.
    pub fn transport() -> Self {
        Self {
            error: || StoreError::Transport("store unavailable".to_string()),
        }
    }

    /// Fails with a not-found error.
    pub fn not_found() -> Self {
        Self {
            error: || StoreError::NotFound("account".to_string()),
        }
    }
}

#[async_trait]
impl AccountStore for FailingAccountStore {
    async fn mark_paid(
        &self,
        _identity: &str,
        _provider_customer_id: &str,
        _amount_minor: Option<i64>,
        _paid_at: Timestamp,
    ) -> Result<WriteOutcome, StoreError> {
        Err((self.error)())
    }

    async fn revoke_access(&self, _identity: &str) -> Result<WriteOutcome, StoreError> {
        Err((self.error)())
    }
}

/// Subscription store that fails every call. For error-path tests.
pub struct FailingSubscriptionStore;

#[async_trait]
impl SubscriptionStore for FailingSubscriptionStore {
    async fn upsert_if_newer(
        &self,
        _record: &SubscriptionRecord,
    ) -> Result<WriteOutcome, StoreError> {
        Err(StoreError::Transport("store unavailable".to_string()))
    }

    async fn mark_canceled(
        &self,
        _identity: &str,
        _subscription_id: &str,
    ) -> Result<WriteOutcome, StoreError> {
        Err(StoreError::Transport("store unavailable".to_string()))
    }
}
