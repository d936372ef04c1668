//! PostgreSQL implementation of the FailureLog port.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::PaymentFailureRecord;
use crate::ports::{FailureLog, StoreError, WriteOutcome};

use super::map_sqlx_err;

/// Append-only failure log over the external `payment_failures` table.
///
/// Rows are never updated after insertion. The unique constraint on
/// `stripe_charge_id` carries the dedup.
pub struct PostgresFailureLog {
    pool: PgPool,
}

impl PostgresFailureLog {
    /// Creates a new log with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FailureLog for PostgresFailureLog {
    async fn append(&self, record: &PaymentFailureRecord) -> Result<WriteOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_failures (id, email, stripe_charge_id, failure_reason, failed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (stripe_charge_id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.identity)
        .bind(&record.provider_charge_id)
        .bind(&record.reason)
        .bind(record.failed_at.as_datetime())
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
