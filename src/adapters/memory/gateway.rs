//! Stub checkout gateway.
//!
//! Records session requests and returns a configured response. Used by
//! tests to assert whether and how the provider boundary was called.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::CheckoutError;
use crate::ports::{CheckoutGateway, CreateSessionRequest, SessionHandle};

enum StubResponse {
    Success(SessionHandle),
    Rejected(String),
    Provider(String),
}

/// Checkout gateway that never leaves the process.
pub struct StubCheckoutGateway {
    response: StubResponse,
    requests: Mutex<Vec<CreateSessionRequest>>,
}

impl StubCheckoutGateway {
    /// Succeeds with a fixed session handle.
    pub fn new() -> Self {
        Self {
            response: StubResponse::Success(SessionHandle {
                id: "cs_test_123".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test_123".to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Succeeds with the given session handle.
    pub fn with_session(session: SessionHandle) -> Self {
        Self {
            response: StubResponse::Success(session),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Rejects every request as invalid (e.g. unknown price).
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            response: StubResponse::Rejected(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every request with a provider/transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: StubResponse::Provider(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CreateSessionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for StubCheckoutGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckoutGateway for StubCheckoutGateway {
    async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<SessionHandle, CheckoutError> {
        self.requests.lock().unwrap().push(request);

        match &self.response {
            StubResponse::Success(session) => Ok(session.clone()),
            StubResponse::Rejected(message) => Err(CheckoutError::Rejected(message.clone())),
            StubResponse::Provider(message) => Err(CheckoutError::Provider(message.clone())),
        }
    }
}
