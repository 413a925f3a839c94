//! Tool invocation.
//!
//! [`Dispatcher::invoke`] resolves a tool, validates its arguments, renders the
//! request, makes exactly one upstream call and interprets the response. Any
//! failure before the call means no request is sent.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{ApiRequest, ApiResponse, TransportError, Upstream};
use crate::definition::ToolDefinition;
use crate::registry::ToolRegistry;
use crate::validate::{Violation, validate};

/// A request to run one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    /// Dotted name or alias.
    pub tool: String,
    /// Argument object; `null` means no arguments.
    pub arguments: Value,
}

impl InvocationRequest {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

/// A successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Dotted name of the tool that ran.
    pub tool: &'static str,
    pub status: u16,
    /// Decoded response body: JSON if it parsed, a string if not, `null` if empty.
    pub payload: Value,
}

/// Failure category, serialized as the `type` of an error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    ValidationError,
    UpstreamError,
    TransportError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::ValidationError => "validation_error",
            Self::UpstreamError => "upstream_error",
            Self::TransportError => "transport_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvocationError {
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("invalid arguments for {tool}: {}", join_violations(.violations))]
    Validation {
        tool: &'static str,
        violations: Vec<Violation>,
    },

    #[error("PayPal API error ({status}): {message}")]
    Upstream {
        status: u16,
        message: String,
        body: Value,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl InvocationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Transport(_) => ErrorKind::TransportError,
        }
    }

    /// HTTP status of an upstream error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Structured form returned to MCP clients.
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "type": self.kind().as_str(),
            "message": self.to_string(),
        });
        match self {
            Self::Validation { violations, .. } => {
                error["details"] = json!(violations);
            }
            Self::Upstream { status, body, .. } => {
                error["code"] = json!(status);
                if !body.is_null() {
                    error["details"] = body.clone();
                }
            }
            Self::UnknownTool { .. } | Self::Transport(_) => {}
        }
        json!({ "error": error })
    }
}

pub type InvocationResult = Result<Invocation, InvocationError>;

/// Runs tools from a registry against an upstream.
#[derive(Debug)]
pub struct Dispatcher<U> {
    registry: Arc<ToolRegistry>,
    upstream: U,
}

impl<U: Upstream> Dispatcher<U> {
    pub fn new(registry: impl Into<Arc<ToolRegistry>>, upstream: U) -> Self {
        Self {
            registry: registry.into(),
            upstream,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub async fn invoke(&self, request: InvocationRequest) -> InvocationResult {
        let tool = self
            .registry
            .get(&request.tool)
            .ok_or_else(|| InvocationError::UnknownTool {
                name: request.tool.clone(),
            })?;

        let api_request = prepare(tool, request.arguments).inspect_err(|e| {
            debug!(tool = tool.name, error = %e, "rejected before sending");
        })?;

        debug!(
            tool = tool.name,
            method = %api_request.method,
            path = %api_request.path,
            "invoking tool"
        );
        let response = self.upstream.send(&api_request).await.inspect_err(|e| {
            warn!(tool = tool.name, error = %e, "transport failure");
        })?;

        let invocation = interpret(tool, response);
        match &invocation {
            Ok(ok) => info!(tool = tool.name, status = ok.status, "tool succeeded"),
            Err(e) => warn!(tool = tool.name, status = e.status(), error = %e, "PayPal rejected request"),
        }
        invocation
    }
}

/// Validate, adjust and render arguments for `tool`.
pub fn prepare(tool: &'static ToolDefinition, arguments: Value) -> Result<ApiRequest, InvocationError> {
    let invalid = |violations| InvocationError::Validation {
        tool: tool.name,
        violations,
    };

    let mut args: Map<String, Value> = validate(tool.params, arguments).map_err(invalid)?;
    if let Some(prepare) = tool.prepare {
        prepare(&mut args).map_err(invalid)?;
    }
    tool.render(&args).map_err(invalid)
}

fn interpret(tool: &'static ToolDefinition, response: ApiResponse) -> InvocationResult {
    let payload = decode_body(&response.body);
    if response.is_success() {
        Ok(Invocation {
            tool: tool.name,
            status: response.status,
            payload,
        })
    } else {
        Err(InvocationError::Upstream {
            status: response.status,
            message: upstream_message(response.status, &payload),
            body: payload,
        })
    }
}

fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Human-readable summary of a PayPal error body.
fn upstream_message(status: u16, body: &Value) -> String {
    let text = |key: &str| body.get(key).and_then(Value::as_str);

    let mut message = match (text("name"), text("message").or(text("error_description"))) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (None, Some(message)) => message.to_string(),
        (Some(name), None) => name.to_string(),
        (None, None) => match body {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => format!("HTTP {status}"),
        },
    };

    let details: Vec<&str> = body
        .get("details")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|detail| {
            detail
                .get("description")
                .or_else(|| detail.get("issue"))
                .and_then(Value::as_str)
        })
        .collect();
    if !details.is_empty() {
        message.push_str(" (");
        message.push_str(&details.join("; "));
        message.push(')');
    }

    if let Some(debug_id) = text("debug_id") {
        message.push_str(&format!(" [debug_id {debug_id}]"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Credentials, Environment, PayPalClient};
    use crate::definition::HttpMethod;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records requests and replays canned responses.
    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<ApiRequest>>,
        response: Option<ApiResponse>,
    }

    impl Recorder {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                requests: Mutex::default(),
                response: Some(ApiResponse::new(status, body)),
            }
        }

        fn calls(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Upstream for Recorder {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.response
                .clone()
                .ok_or_else(|| TransportError::Connect("connection refused".into()))
        }
    }

    fn dispatcher<U: Upstream>(upstream: U) -> Dispatcher<U> {
        Dispatcher::new(ToolRegistry::full().unwrap(), upstream)
    }

    #[tokio::test]
    async fn unknown_tool_makes_no_call() {
        let d = dispatcher(Recorder::replying(200, "{}"));
        let err = d
            .invoke(InvocationRequest::new("invoices.delete", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
        assert!(d.upstream().calls().is_empty());
    }

    #[tokio::test]
    async fn missing_invoice_id_is_a_validation_error_with_no_call() {
        let d = dispatcher(Recorder::replying(202, ""));
        let err = d
            .invoke(InvocationRequest::new("invoices.send", json!({"note": "hi"})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationError);
        match &err {
            InvocationError::Validation { tool, violations } => {
                assert_eq!(*tool, "invoices.send");
                assert_eq!(violations[0].path, "invoice_id");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(d.upstream().calls().is_empty());
    }

    #[tokio::test]
    async fn prepare_failures_make_no_call() {
        let d = dispatcher(Recorder::replying(200, "{}"));
        let err = d
            .invoke(InvocationRequest::new(
                "transactions.list",
                json!({"start_date": "2024-01-01", "end_date": "2024-03-01"}),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(d.upstream().calls().is_empty());
    }

    #[tokio::test]
    async fn dot_segment_ids_cannot_redirect_a_call() {
        let d = dispatcher(Recorder::replying(200, "{}"));
        for (tool, args) in [
            ("disputes.accept", json!({"dispute_id": "..", "note": "x"})),
            ("products.update", json!({"product_id": "..", "operations": []})),
            ("orders.capture", json!({"id": "."})),
        ] {
            let err = d.invoke(InvocationRequest::new(tool, args)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValidationError, "{tool}");
        }
        assert!(d.upstream().calls().is_empty());
    }

    #[tokio::test]
    async fn oversized_order_is_rejected_without_a_call() {
        let d = dispatcher(Recorder::replying(201, "{}"));
        let err = d
            .invoke(InvocationRequest::new(
                "orders.create",
                json!({"currencyCode": "USD", "items": [{"name": "a", "itemCost": 1e16, "quantity": 1000}]}),
            ))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(d.upstream().calls().is_empty());
    }

    #[tokio::test]
    async fn alias_resolves_and_renders_one_request() {
        let d = dispatcher(Recorder::replying(200, r#"{"id":"PROD-1"}"#));
        let ok = d
            .invoke(InvocationRequest::new("show_product_details", json!({"product_id": "PROD-1"})))
            .await
            .unwrap();

        assert_eq!(ok.tool, "products.show");
        assert_eq!(ok.payload, json!({"id": "PROD-1"}));
        let calls = d.upstream().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Get);
        assert_eq!(calls[0].path, "/v1/catalogs/products/PROD-1");
        assert_eq!(calls[0].body, None);
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let d = dispatcher(Recorder::replying(202, ""));
        let ok = d
            .invoke(InvocationRequest::new("invoices.send", json!({"invoice_id": "INV2-1"})))
            .await
            .unwrap();
        assert_eq!(ok.status, 202);
        assert_eq!(ok.payload, Value::Null);
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_as_text() {
        let d = dispatcher(Recorder::replying(502, "Bad Gateway"));
        let err = d
            .invoke(InvocationRequest::new("orders.get", json!({"id": "O-1"})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "PayPal API error (502): Bad Gateway");
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let d = dispatcher(Recorder::default());
        let err = d
            .invoke(InvocationRequest::new("orders.get", json!({"id": "O-1"})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransportError);
        assert_eq!(d.upstream().calls().len(), 1);
        assert_eq!(err.to_json()["error"]["type"], "transport_error");
    }

    #[test]
    fn upstream_message_collects_details() {
        let body = json!({
            "name": "UNPROCESSABLE_ENTITY",
            "message": "The requested action could not be performed.",
            "debug_id": "f1b2c3",
            "details": [
                {"issue": "ORDER_NOT_APPROVED", "description": "Payer has not yet approved the Order."},
                {"issue": "OTHER"},
            ],
        });
        assert_eq!(
            upstream_message(422, &body),
            "UNPROCESSABLE_ENTITY: The requested action could not be performed. \
             (Payer has not yet approved the Order.; OTHER) [debug_id f1b2c3]"
        );
        assert_eq!(upstream_message(401, &Value::Null), "HTTP 401");
        assert_eq!(
            upstream_message(401, &json!({"error": "invalid_token", "error_description": "Token signature verification failed"})),
            "Token signature verification failed"
        );
    }

    #[test]
    fn validation_error_json_lists_violations() {
        let err = InvocationError::Validation {
            tool: "invoices.send",
            violations: vec![Violation::new("invoice_id", "is required")],
        };
        assert_eq!(
            err.to_json(),
            json!({"error": {
                "type": "validation_error",
                "message": "invalid arguments for invoices.send: invoice_id: is required",
                "details": [{"path": "invoice_id", "reason": "is required"}],
            }})
        );
    }

    fn mock_dispatcher(url: String, timeout: Duration) -> Dispatcher<PayPalClient> {
        let credentials = Credentials::new("test-token", Environment::Sandbox).unwrap();
        let client = PayPalClient::builder(credentials)
            .base_url(url)
            .timeout(timeout)
            .build()
            .unwrap();
        dispatcher(client)
    }

    #[tokio::test]
    async fn create_order_against_mock_returns_created_payload() {
        let mut server = mockito::Server::new_async().await;
        let created = json!({
            "id": "5O190127TN364715T",
            "status": "CREATED",
            "links": [{"href": "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T", "rel": "payer-action", "method": "GET"}],
        });
        let mock = server
            .mock("POST", "/v2/checkout/orders")
            .match_header("authorization", "Bearer test-token")
            .match_body(mockito::Matcher::PartialJson(json!({
                "intent": "CAPTURE",
                "purchase_units": [{"amount": {"currency_code": "USD", "value": "20.00"}}],
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(created.to_string())
            .expect(1)
            .create_async()
            .await;

        let d = mock_dispatcher(server.url(), Duration::from_secs(5));
        let ok = d
            .invoke(InvocationRequest::new(
                "orders.create",
                json!({
                    "currencyCode": "USD",
                    "items": [{"name": "Widget", "quantity": 2, "itemCost": 10, "itemTotal": 20}],
                }),
            ))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(ok.status, 201);
        assert_eq!(ok.payload, created);
    }

    #[tokio::test]
    async fn accept_claim_404_is_an_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "name": "RESOURCE_NOT_FOUND",
            "message": "The specified resource does not exist.",
            "debug_id": "8a2c1d",
        });
        let mock = server
            .mock("POST", "/v1/customer/disputes/PP-D-404/accept-claim")
            .match_body(mockito::Matcher::Json(json!({"note": "Refunding in full"})))
            .with_status(404)
            .with_body(body.to_string())
            .create_async()
            .await;

        let d = mock_dispatcher(server.url(), Duration::from_secs(5));
        let err = d
            .invoke(InvocationRequest::new(
                "disputes.accept",
                json!({"dispute_id": "PP-D-404", "note": "Refunding in full"}),
            ))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.status(), Some(404));
        let payload = err.to_json();
        assert_eq!(payload["error"]["code"], 404);
        assert_eq!(payload["error"]["details"], body);
        assert!(err.to_string().contains("RESOURCE_NOT_FOUND"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer.
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let d = mock_dispatcher(format!("http://{addr}"), Duration::from_millis(200));
        let err = d
            .invoke(InvocationRequest::new("orders.get", json!({"id": "O-1"})))
            .await
            .unwrap_err();
        hold.abort();

        assert!(matches!(
            err,
            InvocationError::Transport(TransportError::Timeout(_))
        ));
    }
}
