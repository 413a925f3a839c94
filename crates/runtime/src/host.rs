//! Serves the dispatcher's tools over MCP.

use mcp::{CallToolResult, ServerInfo, Tool, ToolHandler};
use serde_json::{Value, json};

use crate::backend::Upstream;
use crate::dispatch::{Dispatcher, Invocation, InvocationRequest};

pub const SERVER_NAME: &str = "paypal";

/// [`ToolHandler`] that runs every call through a [`Dispatcher`].
///
/// Tools are advertised under their aliases, since MCP clients commonly
/// restrict tool names to identifier characters.
pub struct PayPalToolHost<U> {
    dispatcher: Dispatcher<U>,
    instructions: Option<String>,
}

impl<U: Upstream> PayPalToolHost<U> {
    pub fn new(dispatcher: Dispatcher<U>) -> Self {
        Self {
            dispatcher,
            instructions: None,
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher<U> {
        &self.dispatcher
    }
}

/// Text returned for a successful call.
fn success_text(invocation: &Invocation) -> String {
    match &invocation.payload {
        Value::Null => format!("{:#}", json!({ "status": invocation.status })),
        Value::String(text) => text.clone(),
        payload => format!("{payload:#}"),
    }
}

impl<U: Upstream + 'static> ToolHandler for PayPalToolHost<U> {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn instructions(&self) -> Option<String> {
        self.instructions.clone()
    }

    fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .registry()
            .iter()
            .map(|tool| Tool {
                name: tool.alias.to_string(),
                title: Some(tool.title.to_string()),
                description: Some(tool.description.to_string()),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Option<Value>) -> CallToolResult {
        let request = InvocationRequest::new(name, arguments.unwrap_or(Value::Null));
        match self.dispatcher.invoke(request).await {
            Ok(invocation) => CallToolResult::text(success_text(&invocation)),
            Err(e) => CallToolResult::error(format!("{:#}", e.to_json())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ApiRequest, ApiResponse, TransportError};
    use crate::registry::ToolRegistry;
    use policy::ToolPolicy;

    struct Fixed(u16, &'static str);

    impl Upstream for Fixed {
        async fn send(&self, _request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            Ok(ApiResponse::new(self.0, self.1))
        }
    }

    fn host(upstream: Fixed, tools: &str) -> PayPalToolHost<Fixed> {
        let policy = ToolPolicy::from_list(tools).unwrap();
        let registry = ToolRegistry::from_policy(&policy).unwrap();
        PayPalToolHost::new(Dispatcher::new(registry, upstream))
    }

    #[test]
    fn tools_are_listed_by_alias_with_schemas() {
        let host = host(Fixed(200, "{}"), "invoices.*");
        let tools = host.tools();
        assert_eq!(tools.len(), 7);
        assert_eq!(tools[0].name, "create_invoice");
        assert_eq!(tools[0].title.as_deref(), Some("Create Invoice"));
        assert_eq!(tools[0].input_schema["required"], json!(["detail"]));
    }

    #[tokio::test]
    async fn success_is_pretty_json_text() {
        let host = host(Fixed(200, r#"{"id":"O-1","status":"COMPLETED"}"#), "all");
        let result = host.call_tool("capture_order", Some(json!({"id": "O-1"}))).await;
        assert!(!result.is_error);
        let text = result.content[0].as_text().unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(text).unwrap(),
            json!({"id": "O-1", "status": "COMPLETED"})
        );
        assert!(text.contains('\n'));
    }

    #[tokio::test]
    async fn empty_body_reports_status() {
        let host = host(Fixed(204, ""), "all");
        let result = host
            .call_tool("cancel_subscription", Some(json!({"subscription_id": "I-1", "payload": {"reason": "moving"}})))
            .await;
        let text = result.content[0].as_text().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"status": 204}));
    }

    #[tokio::test]
    async fn errors_are_flagged_with_structured_text() {
        let host = host(Fixed(200, "{}"), "orders.*");
        let result = host.call_tool("create_invoice", Some(json!({}))).await;
        assert!(result.is_error);
        let text = result.content[0].as_text().unwrap();
        let error: Value = serde_json::from_str(text).unwrap();
        assert_eq!(error["error"]["type"], "unknown_tool");
    }

    #[tokio::test]
    async fn mcp_session_against_mock_paypal() {
        use crate::backend::{Credentials, Environment, PayPalClient};
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut paypal = mockito::Server::new_async().await;
        let mock = paypal
            .mock("GET", "/v1/customer/disputes")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("dispute_state".into(), "RESOLVED".into()),
                mockito::Matcher::UrlEncoded("page_size".into(), "10".into()),
                mockito::Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"items":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let credentials = Credentials::new("test-token", Environment::Sandbox).unwrap();
        let client = PayPalClient::builder(credentials)
            .base_url(paypal.url())
            .build()
            .unwrap();
        let registry = ToolRegistry::from_policy(&ToolPolicy::from_list("disputes.*").unwrap()).unwrap();
        let host = PayPalToolHost::new(Dispatcher::new(registry, client));

        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-06-18","capabilities":{}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"list_disputes","arguments":{"dispute_state":"resolved"}}}"#,
        ]
        .join("\n");

        let (mut client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, mut client_out) = tokio::io::duplex(64 * 1024);
        client_in.write_all(input.as_bytes()).await.unwrap();
        client_in.write_all(b"\n").await.unwrap();
        drop(client_in);

        mcp::Server::new(host).serve(server_in, server_out).await.unwrap();

        let mut output = String::new();
        client_out.read_to_string(&mut output).await.unwrap();
        let responses: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let by_id = |id: i64| responses.iter().find(|r| r["id"] == id).unwrap();

        assert_eq!(by_id(1)["result"]["serverInfo"]["name"], SERVER_NAME);
        let names: Vec<&str> = by_id(2)["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["list_disputes", "get_dispute", "accept_dispute_claim"]);

        let call = &by_id(3)["result"];
        assert_eq!(call["isError"], false);
        let text = call["content"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"items": []}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_arguments_are_a_validation_error() {
        let host = host(Fixed(200, "{}"), "all");
        let result = host.call_tool("get_order", None).await;
        assert!(result.is_error);
        let error: Value = serde_json::from_str(result.content[0].as_text().unwrap()).unwrap();
        assert_eq!(error["error"]["type"], "validation_error");
        assert_eq!(error["error"]["details"][0]["path"], "id");
    }
}
