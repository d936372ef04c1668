//! Application command handlers.
//!
//! Each handler wires domain logic to the ports it needs. Dependencies
//! arrive as `Arc<dyn _>` so handlers stay testable against in-memory
//! implementations.

mod create_checkout;
mod process_webhook;
mod reconcile;

pub use create_checkout::{CreateCheckoutCommand, CreateCheckoutHandler};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, WebhookOutcome};
pub use reconcile::{ReconcileOutcome, Reconciler};
