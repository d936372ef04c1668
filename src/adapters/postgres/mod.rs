//! PostgreSQL adapters - conditional-write store implementations.
//!
//! The schema is owned by the external store; every operation here is a
//! guarded write or an append, never DDL. Conditional `WHERE` clauses
//! carry the idempotence and ordering guarantees, so no application-level
//! locks are taken.

mod account_store;
mod failure_log;
mod subscription_store;

pub use account_store::PostgresAccountStore;
pub use failure_log::PostgresFailureLog;
pub use subscription_store::PostgresSubscriptionStore;

use crate::ports::StoreError;

/// Maps sqlx failures onto the distinguishable store error kinds.
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.constraint() {
            Some(constraint) => StoreError::Conflict(format!("constraint {}", constraint)),
            None => StoreError::Transport(err.to_string()),
        },
        sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
        _ => StoreError::Transport(err.to_string()),
    }
}
