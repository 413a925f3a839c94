//! Upstream HTTP abstraction.
//!
//! The dispatcher talks to PayPal through the [`Upstream`] trait so tests can
//! substitute a recording fake for the real client.

mod paypal;

pub use paypal::{
    Credentials, DEFAULT_TIMEOUT, Environment, PRODUCTION_URL, PayPalClient, PayPalClientBuilder,
    SANDBOX_URL,
};

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::definition::HttpMethod;

/// A fully rendered request, relative to the upstream base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Percent-encoded path, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Raw upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Sends rendered requests to the PayPal API.
pub trait Upstream: Send + Sync {
    /// Send one request. Non-2xx statuses are responses, not errors.
    fn send(
        &self,
        request: &ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}
