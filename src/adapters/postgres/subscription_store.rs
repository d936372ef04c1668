//! PostgreSQL implementation of the SubscriptionStore port.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::SubscriptionRecord;
use crate::ports::{StoreError, SubscriptionStore, WriteOutcome};

use super::map_sqlx_err;

/// Subscription store over the external `subscriptions` table, keyed by
/// `(email, stripe_subscription_id)`.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new store with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn upsert_if_newer(
        &self,
        record: &SubscriptionRecord,
    ) -> Result<WriteOutcome, StoreError> {
        // Insert, or overwrite only a non-terminal row whose period end is
        // not newer. A rejected conflict-update affects zero rows; that is
        // a stale delivery, not an error.
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (email, stripe_subscription_id, status, current_period_end)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email, stripe_subscription_id) DO UPDATE SET
                status = EXCLUDED.status,
                current_period_end = EXCLUDED.current_period_end
            WHERE subscriptions.status NOT IN ('canceled', 'incomplete_expired')
              AND subscriptions.current_period_end <= EXCLUDED.current_period_end
            "#,
        )
        .bind(&record.identity)
        .bind(&record.provider_subscription_id)
        .bind(record.status.as_str())
        .bind(record.current_period_end.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() > 0 {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Unchanged)
        }
    }

    async fn mark_canceled(
        &self,
        identity: &str,
        subscription_id: &str,
    ) -> Result<WriteOutcome, StoreError> {
        // Terminal write: wins regardless of stored period end. Inserting
        // on a missing row records the cancellation so a stale update
        // arriving later cannot resurrect the subscription.
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (email, stripe_subscription_id, status, current_period_end)
            VALUES ($1, $2, 'canceled', NOW())
            ON CONFLICT (email, stripe_subscription_id) DO UPDATE SET
                status = 'canceled'
            WHERE subscriptions.status <> 'canceled'
            "#,
        )
        .bind(identity)
        .bind(subscription_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() > 0 {
            Ok(WriteOutcome::Applied)
        } else {
            Ok(WriteOutcome::Unchanged)
        }
    }
}
