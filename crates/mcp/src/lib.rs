//! MCP (Model Context Protocol) server library.
//!
//! This crate serves tools to an MCP client over stdio: it decodes JSON-RPC
//! requests, answers `initialize`, `ping`, `tools/list` and `tools/call`, and
//! hands tool execution to a [`ToolHandler`].
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, Server, ServerInfo, Tool, ToolHandler};
//! use serde_json::Value;
//!
//! struct Hello;
//!
//! impl ToolHandler for Hello {
//!     fn server_info(&self) -> ServerInfo {
//!         ServerInfo { name: "hello".into(), version: "0.1.0".into() }
//!     }
//!
//!     fn tools(&self) -> Vec<Tool> {
//!         vec![Tool {
//!             name: "greet".into(),
//!             title: None,
//!             description: Some("Say hello".into()),
//!             input_schema: serde_json::json!({"type": "object"}),
//!         }]
//!     }
//!
//!     async fn call_tool(&self, _name: &str, _arguments: Option<Value>) -> CallToolResult {
//!         CallToolResult::text("hello")
//!     }
//! }
//!
//! # async fn example() -> mcp::Result<()> {
//! Server::new(Hello).serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod server;
mod transport;

pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, CancelledParams, ClientInfo, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolContent, ToolsCapability,
};
pub use server::{
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS, Server, ToolHandler,
};
pub use transport::{Frame, FrameReader, Framing, write_frame};
