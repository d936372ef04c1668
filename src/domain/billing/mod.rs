//! Billing domain module.
//!
//! The payment-event reconciliation core: authenticating inbound provider
//! events, classifying them into a closed transition set, and the record
//! types those transitions act on.
//!
//! # Module Structure
//!
//! - `event` - verified provider event shape
//! - `verifier` - HMAC signature verification with replay protection
//! - `transition` - classification into the closed transition set
//! - `records` - account / subscription / failure-log record types
//! - `errors` - webhook and checkout error taxonomies

mod errors;
mod event;
mod records;
mod transition;
mod verifier;

pub use errors::{CheckoutError, WebhookError};
pub use event::{ProviderEvent, ProviderEventData};
pub use records::{
    AccountRecord, PaymentFailureRecord, PaymentStatus, SubscriptionRecord, SubscriptionStatus,
};
pub use transition::Transition;
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use event::ProviderEventBuilder;
#[cfg(test)]
pub use verifier::sign_test_payload;
