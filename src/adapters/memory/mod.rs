//! In-memory adapters for tests and local development.

mod gateway;
mod stores;

pub use gateway::StubCheckoutGateway;
pub use stores::{
    FailingAccountStore, FailingSubscriptionStore, InMemoryAccountStore, InMemoryFailureLog,
    InMemorySubscriptionStore,
};
