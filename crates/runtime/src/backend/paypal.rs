//! PayPal REST API client.

use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use super::{ApiRequest, ApiResponse, TransportError, Upstream};
use crate::definition::HttpMethod;
use crate::{Error, Result};

pub const SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";
pub const PRODUCTION_URL: &str = "https://api-m.paypal.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which PayPal deployment requests go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "SANDBOX", alias = "Sandbox")]
    Sandbox,
    #[serde(alias = "PRODUCTION", alias = "Production")]
    Production,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "sandbox"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" | "live" => Ok(Self::Production),
            other => Err(Error::Config(format!(
                "unknown PayPal environment: {other} (expected SANDBOX or PRODUCTION)"
            ))),
        }
    }
}

/// Bearer token plus target environment.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    environment: Environment,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, environment: Environment) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(Error::Config("access token is empty".to_string()));
        }
        Ok(Self {
            access_token,
            environment,
        })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Builder for [`PayPalClient`].
#[derive(Debug, Clone)]
pub struct PayPalClientBuilder {
    credentials: Credentials,
    timeout: Duration,
    base_url: Option<String>,
}

impl PayPalClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            timeout: DEFAULT_TIMEOUT,
            base_url: None,
        }
    }

    /// Per-request timeout, covering connect through reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send requests somewhere other than the environment's host.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<PayPalClient> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.credentials.environment.base_url());
        let mut base_url =
            Url::parse(raw).map_err(|e| Error::Config(format!("invalid base URL {raw}: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("paypal-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(PayPalClient {
            client,
            credentials: self.credentials,
            base_url,
            timeout: self.timeout,
        })
    }
}

/// HTTP client bound to one set of credentials.
#[derive(Debug, Clone)]
pub struct PayPalClient {
    client: reqwest::Client,
    credentials: Credentials,
    base_url: Url,
    timeout: Duration,
}

impl PayPalClient {
    pub fn builder(credentials: Credentials) -> PayPalClientBuilder {
        PayPalClientBuilder::new(credentials)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn environment(&self) -> Environment {
        self.credentials.environment
    }

    fn url_for(&self, request: &ApiRequest) -> std::result::Result<Url, TransportError> {
        let mut url = self
            .base_url
            .join(request.path.trim_start_matches('/'))
            .map_err(|e| TransportError::Request(format!("bad request path: {e}")))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

impl fmt::Display for PayPalClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "paypal({}, {})", self.credentials.environment, self.base_url)
    }
}

fn reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

impl Upstream for PayPalClient {
    async fn send(&self, request: &ApiRequest) -> std::result::Result<ApiResponse, TransportError> {
        let url = self.url_for(request)?;
        debug!(method = %request.method, %url, "sending PayPal request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method), url)
            .bearer_auth(&self.credentials.access_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(status, bytes = body.len(), "PayPal response received");

        Ok(ApiResponse { status, body })
    }
}
