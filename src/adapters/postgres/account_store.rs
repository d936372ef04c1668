//! PostgreSQL implementation of the AccountStore port.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::Timestamp;
use crate::ports::{AccountStore, StoreError, WriteOutcome};

use super::map_sqlx_err;

/// Account store over the external `accounts` table, keyed by email.
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinguishes a guard rejection from a missing record after an
    /// update touched zero rows.
    async fn exists(&self, identity: &str) -> Result<bool, StoreError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM accounts WHERE email = $1")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn mark_paid(
        &self,
        identity: &str,
        provider_customer_id: &str,
        amount_minor: Option<i64>,
        paid_at: Timestamp,
    ) -> Result<WriteOutcome, StoreError> {
        // The guard keeps an equal-or-later payment in place, which makes
        // duplicate and out-of-order deliveries no-ops.
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                payment_status = 'paid',
                stripe_customer_id = $2,
                paid_at = $3,
                amount_paid_minor = $4
            WHERE email = $1
              AND NOT (payment_status = 'paid' AND paid_at >= $3)
            "#,
        )
        .bind(identity)
        .bind(provider_customer_id)
        .bind(paid_at.as_datetime())
        .bind(amount_minor)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Applied);
        }

        if self.exists(identity).await? {
            Ok(WriteOutcome::Unchanged)
        } else {
            Err(StoreError::NotFound(format!("account {}", identity)))
        }
    }

    async fn revoke_access(&self, identity: &str) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET payment_status = 'canceled'
            WHERE email = $1 AND payment_status <> 'canceled'
            "#,
        )
        .bind(identity)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() > 0 {
            return Ok(WriteOutcome::Applied);
        }

        if self.exists(identity).await? {
            Ok(WriteOutcome::Unchanged)
        } else {
            Err(StoreError::NotFound(format!("account {}", identity)))
        }
    }
}
