//! Stripe adapter - payment provider boundary over the REST API.

mod gateway;

pub use gateway::{StripeCheckoutGateway, StripeConfig};
