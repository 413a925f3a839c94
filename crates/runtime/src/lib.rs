//! PayPal tool runtime.
//!
//! Turns named tool calls into PayPal REST requests. Each tool is a static
//! [`ToolDefinition`] (parameter schema, HTTP method, path template and body
//! shape); the [`Dispatcher`] validates arguments against that schema, sends
//! one request through an [`Upstream`] and classifies the outcome.
//!
//! # Overview
//!
//! - **ToolRegistry**: the built-in catalog, filtered by a [`policy::ToolPolicy`].
//! - **Dispatcher**: the single `invoke` path shared by every tool.
//! - **PayPalClient**: the reqwest-backed [`Upstream`].
//! - **PayPalToolHost**: exposes the registry as an MCP [`mcp::ToolHandler`].
//!
//! # Example
//!
//! ```no_run
//! use policy::ToolPolicy;
//! use runtime::{Credentials, Dispatcher, Environment, InvocationRequest, PayPalClient, ToolRegistry};
//! use serde_json::json;
//!
//! # async fn example() -> runtime::Result<()> {
//! let credentials = Credentials::new("A21AA...", Environment::Sandbox)?;
//! let client = PayPalClient::builder(credentials).build()?;
//! let registry = ToolRegistry::from_policy(&ToolPolicy::from_list("orders.*")?)?;
//!
//! let dispatcher = Dispatcher::new(registry, client);
//! match dispatcher
//!     .invoke(InvocationRequest::new("orders.get", json!({"id": "5O190127TN364715T"})))
//!     .await
//! {
//!     Ok(order) => println!("{}", order.payload),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod catalog;
mod definition;
mod dispatch;
mod error;
mod host;
mod registry;
pub mod schema;
mod validate;

pub use backend::{
    ApiRequest, ApiResponse, Credentials, DEFAULT_TIMEOUT, Environment, PRODUCTION_URL,
    PayPalClient, PayPalClientBuilder, SANDBOX_URL, TransportError, Upstream,
};
pub use definition::{Body, BodyBuilder, HttpMethod, Prepare, ToolDefinition};
pub use dispatch::{
    Dispatcher, ErrorKind, Invocation, InvocationError, InvocationRequest, InvocationResult,
    prepare,
};
pub use error::{Error, Result};
pub use host::{PayPalToolHost, SERVER_NAME};
pub use registry::ToolRegistry;
pub use validate::{Violation, validate};
