//! The MCP server loop: JSON-RPC 2.0 over line-delimited stdin/stdout.
//!
//! Transport framing stops here; the dispatcher only ever sees a tool name
//! and raw arguments, and every `tools/call` result carries the canonical
//! envelope as text content.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ToolContent, ToolSchema,
};
use anyhow::Result;
use fathom_core::Dispatcher;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::codec::{FramedRead, LinesCodec};

pub struct McpServer {
    dispatcher: Arc<Dispatcher>,
}

impl McpServer {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Serve until stdin closes. Nothing a client sends can escape this
    /// loop: malformed lines become JSON-RPC parse errors, unknown methods
    /// become method-not-found, and failed invocations become envelopes.
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
        let mut stdout = tokio::io::stdout();

        tracing::info!("MCP server listening on stdio");

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            stdout.write_all(out.as_bytes()).await?;
            stdout.flush().await?;
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(err) => Some(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::parse_error(err.to_string()),
            )),
        }
    }

    /// Handle one decoded message. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, InitializeResult::current()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => {
                let tools: Vec<ToolSchema> = self
                    .dispatcher
                    .registry()
                    .specs()
                    .iter()
                    .map(ToolSchema::from)
                    .collect();
                JsonRpcResponse::success(id, ListToolsResult { tools })
            }
            "tools/call" => {
                let params = match request.params {
                    Some(params) => match serde_json::from_value::<CallToolParams>(params) {
                        Ok(params) => params,
                        Err(err) => {
                            return Some(JsonRpcResponse::failure(
                                id,
                                JsonRpcError::invalid_params(format!(
                                    "tools/call expects {{name, arguments}}: {err}"
                                )),
                            ));
                        }
                    },
                    None => {
                        return Some(JsonRpcResponse::failure(
                            id,
                            JsonRpcError::invalid_params("tools/call requires params"),
                        ));
                    }
                };

                let envelope = self.dispatcher.invoke(&params.name, &params.arguments).await;
                let text = serde_json::to_string(&envelope)
                    .unwrap_or_else(|_| r#"{"ok":false,"data":null,"error":{"kind":"InternalError","message":"envelope serialization failed"}}"#.to_string());

                JsonRpcResponse::success(
                    id,
                    CallToolResult {
                        content: vec![ToolContent::text(text)],
                        is_error: Some(!envelope.ok),
                    },
                )
            }
            other => JsonRpcResponse::failure(id, JsonRpcError::method_not_found(other)),
        };

        Some(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_core::{
        Envelope, Handler, HandlerError, ToolDefinition, ToolRegistry, ToolSpec, ValidatedArgs,
    };
    use serde_json::json;

    struct PingHandler;

    #[async_trait::async_trait]
    impl Handler for PingHandler {
        async fn call(&self, _args: ValidatedArgs) -> Result<Value, HandlerError> {
            Ok(json!("pong"))
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new(
                ToolSpec::new("ping_tool", "Answers pong"),
                Arc::new(PingHandler),
            ))
            .unwrap();
        McpServer::new(Arc::new(Dispatcher::new(Arc::new(registry))))
    }

    fn request(id: u64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(id)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_and_list() {
        let server = server();

        let response = server
            .handle_request(request(1, "initialize", Some(json!({}))))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "fathom-mcp");

        let response = server
            .handle_request(request(2, "tools/list", None))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "ping_tool");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(server.handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_call_wraps_envelope() {
        let server = server();

        let response = server
            .handle_request(request(
                3,
                "tools/call",
                Some(json!({"name": "ping_tool", "arguments": {}})),
            ))
            .await
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], false);
        let ToolContent::Text { text } =
            serde_json::from_value::<CallToolResult>(result).unwrap().content.remove(0);
        let envelope: Envelope = serde_json::from_str(&text).unwrap();
        assert!(envelope.ok);
        assert_eq!(envelope.data, Some(json!("pong")));
    }

    #[tokio::test]
    async fn test_unknown_tool_stays_inside_envelope() {
        let server = server();

        let response = server
            .handle_request(request(
                4,
                "tools/call",
                Some(json!({"name": "frobnicate", "arguments": {}})),
            ))
            .await
            .unwrap();

        // A JSON-RPC level success whose payload is a failed envelope.
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        let envelope: Envelope = serde_json::from_str(text).unwrap();
        assert_eq!(envelope.error.unwrap().kind.as_str(), "UnknownToolError");
    }

    #[tokio::test]
    async fn test_malformed_line_yields_parse_error() {
        let server = server();
        let response = server.handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server();
        let response = server
            .handle_request(request(5, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }
}
