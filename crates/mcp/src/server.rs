//! MCP server loop (read requests, dispatch, write responses).

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::{self, AbortHandle, JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, CancelledParams, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, RequestId,
    ServerCapabilities, ServerInfo, Tool, ToolsCapability,
};
use crate::transport::{Framing, FrameReader, write_frame};

/// Protocol version answered when the client asks for one we don't know.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Protocol versions this server can speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Maximum inbound message size (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Trait for whatever answers tool requests behind the server.
///
/// Implementations describe the tools they expose and execute calls.
/// Failures are reported inside [`CallToolResult`] (`is_error`), never as
/// protocol errors.
pub trait ToolHandler: Send + Sync + 'static {
    /// Name and version reported to the client.
    fn server_info(&self) -> ServerInfo;

    /// Optional usage hints for the model.
    fn instructions(&self) -> Option<String> {
        None
    }

    /// Tools exposed by tools/list.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a tool call.
    fn call_tool(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> impl Future<Output = CallToolResult> + Send;
}

type Outbox = mpsc::UnboundedSender<(Framing, JsonRpcResponse)>;

/// MCP server bound to a tool handler.
pub struct Server<H> {
    handler: Arc<H>,
}

/// Per-connection state owned by the read loop.
#[derive(Default)]
struct Connection {
    initialized: bool,
    in_flight: HashMap<RequestId, AbortHandle>,
    /// Which request each running call task answers.
    tasks: HashMap<task::Id, (RequestId, Framing)>,
}

impl Connection {
    /// Forget a finished call task. A call that panicked still gets a reply;
    /// a cancelled one does not.
    fn finish(&mut self, joined: std::result::Result<(task::Id, ()), JoinError>, outbox: &Outbox) {
        let (task_id, failure) = match joined {
            Ok((task_id, ())) => (task_id, None),
            Err(e) => (e.id(), Some(e)),
        };
        let Some((id, framing)) = self.tasks.remove(&task_id) else {
            return;
        };
        if self.in_flight.get(&id).is_some_and(|h| h.id() == task_id) {
            self.in_flight.remove(&id);
        }

        if let Some(e) = failure.filter(JoinError::is_panic) {
            warn!(request_id = %id, error = %e, "tool call panicked");
            send(
                outbox,
                framing,
                JsonRpcResponse::failure(Some(id), JsonRpcError::internal("tool call failed")),
            );
        }
    }
}

impl<H: ToolHandler> Server<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Serve on the process' stdin/stdout until stdin closes.
    pub async fn serve_stdio(self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve on an arbitrary reader/writer pair until the reader hits EOF.
    ///
    /// Tool calls run concurrently; all replies funnel through one writer
    /// task so frames never interleave. On EOF, in-flight calls are allowed
    /// to finish before returning.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbox, mut inbox) = mpsc::unbounded_channel::<(Framing, JsonRpcResponse)>();

        let writer_task = tokio::spawn(async move {
            let mut writer = writer;
            while let Some((framing, response)) = inbox.recv().await {
                let payload = serde_json::to_string(&response)?;
                write_frame(&mut writer, framing, &payload).await?;
            }
            Ok::<(), Error>(())
        });

        let mut frames = FrameReader::new(reader, MAX_MESSAGE_SIZE);
        let mut connection = Connection::default();
        let mut calls = JoinSet::new();

        let read_result = loop {
            let frame = match frames.next_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(()),
                Err(Error::MessageTooLarge { size, max }) => {
                    warn!(size, max, "dropping oversized message");
                    send(
                        &outbox,
                        Framing::Line,
                        JsonRpcResponse::failure(
                            None,
                            JsonRpcError::invalid_request(format!(
                                "message of {size} bytes exceeds {max}"
                            )),
                        ),
                    );
                    continue;
                }
                Err(Error::InvalidMessage(detail)) => {
                    warn!(%detail, "dropping malformed message");
                    send(
                        &outbox,
                        Framing::Line,
                        JsonRpcResponse::failure(None, JsonRpcError::parse_error(detail)),
                    );
                    continue;
                }
                Err(e) => break Err(e),
            };

            while let Some(joined) = calls.try_join_next_with_id() {
                connection.finish(joined, &outbox);
            }
            self.handle_frame(frame.framing, &frame.payload, &mut connection, &mut calls, &outbox);
        };

        debug!(pending = calls.len(), "input closed, draining in-flight calls");
        while let Some(joined) = calls.join_next_with_id().await {
            connection.finish(joined, &outbox);
        }
        drop(outbox);

        writer_task
            .await
            .map_err(|e| Error::Writer(e.to_string()))??;

        info!("client disconnected");
        read_result
    }

    fn handle_frame(
        &self,
        framing: Framing,
        payload: &str,
        connection: &mut Connection,
        calls: &mut JoinSet<()>,
        outbox: &Outbox,
    ) {
        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparseable message");
                send(outbox, framing, JsonRpcResponse::failure(None, JsonRpcError::parse_error(e.to_string())));
                return;
            }
        };

        if value.get("method").is_none() && value.get("id").is_some() {
            // A response to a server-initiated request; this server sends none.
            debug!("ignoring client response");
            return;
        }

        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = value
                    .get("id")
                    .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
                send(outbox, framing, JsonRpcResponse::failure(id, JsonRpcError::invalid_request(e.to_string())));
                return;
            }
        };

        match request.id.clone() {
            None => self.handle_notification(&request, connection),
            Some(id) => self.handle_request(id, request, framing, connection, calls, outbox),
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest, connection: &mut Connection) {
        match request.method.as_str() {
            "notifications/initialized" => {
                debug!("client finished initialization");
            }
            "notifications/cancelled" => {
                let Ok(params) = request.parse_params::<CancelledParams>() else {
                    warn!("malformed cancellation notification");
                    return;
                };
                if let Some(handle) = connection.in_flight.remove(&params.request_id) {
                    info!(request_id = %params.request_id, reason = ?params.reason, "cancelling tool call");
                    handle.abort();
                }
            }
            other => debug!(method = other, "ignoring notification"),
        }
    }

    fn handle_request(
        &self,
        id: RequestId,
        request: JsonRpcRequest,
        framing: Framing,
        connection: &mut Connection,
        calls: &mut JoinSet<()>,
        outbox: &Outbox,
    ) {
        let response = match request.method.as_str() {
            "initialize" => match request.parse_params::<InitializeParams>() {
                Ok(params) => {
                    connection.initialized = true;
                    JsonRpcResponse::from_result(id, self.initialize(params))
                }
                Err(e) => JsonRpcResponse::failure(Some(id), e),
            },
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            _ if !connection.initialized => {
                JsonRpcResponse::failure(Some(id), JsonRpcError::not_initialized())
            }
            "tools/list" => JsonRpcResponse::from_result(
                id,
                ListToolsResult {
                    tools: self.handler.tools(),
                },
            ),
            "tools/call" => match request.parse_params::<CallToolParams>() {
                Ok(params) => {
                    self.spawn_call(id, params, framing, connection, calls, outbox);
                    return;
                }
                Err(e) => JsonRpcResponse::failure(Some(id), e),
            },
            method => JsonRpcResponse::failure(Some(id), JsonRpcError::method_not_found(method)),
        };

        send(outbox, framing, response);
    }

    fn initialize(&self, params: InitializeParams) -> InitializeResult {
        let requested = params.protocol_version.as_str();
        let protocol_version = if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
            requested
        } else {
            PROTOCOL_VERSION
        };

        let client = params
            .client_info
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("unknown");
        info!(client, protocol_version, "client initialized");

        InitializeResult {
            protocol_version: protocol_version.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.handler.server_info(),
            instructions: self.handler.instructions(),
        }
    }

    fn spawn_call(
        &self,
        id: RequestId,
        params: CallToolParams,
        framing: Framing,
        connection: &mut Connection,
        calls: &mut JoinSet<()>,
        outbox: &Outbox,
    ) {
        let handler = Arc::clone(&self.handler);
        let outbox = outbox.clone();
        let response_id = id.clone();

        let handle = calls.spawn(async move {
            let result = handler.call_tool(&params.name, params.arguments).await;
            send(&outbox, framing, JsonRpcResponse::from_result(response_id, result));
        });

        connection.tasks.insert(handle.id(), (id.clone(), framing));
        connection.in_flight.insert(id, handle);
    }
}

fn send(outbox: &Outbox, framing: Framing, response: JsonRpcResponse) {
    if outbox.send((framing, response)).is_err() {
        warn!("response writer closed, dropping reply");
    }
}
