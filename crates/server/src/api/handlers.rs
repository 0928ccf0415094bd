use crate::config::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use fathom_core::Envelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// List every registered tool with its input schema.
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ListToolsResponse> {
    let tools = state
        .dispatcher
        .registry()
        .specs()
        .iter()
        .map(|spec| ToolDescription {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: spec.input_schema(),
        })
        .collect();
    Json(ListToolsResponse { tools })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDescription>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDescription {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Invoke a tool named in the path; the body is the raw argument object.
pub async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> Json<Envelope> {
    Json(state.dispatcher.invoke(&name, &arguments).await)
}

/// Invoke with the tool name in the body, mirroring the MCP `tools/call`
/// parameter shape.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvokeRequest>,
) -> Json<Envelope> {
    Json(state.dispatcher.invoke(&request.tool, &request.arguments).await)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_core::{
        Dispatcher, ErrorKind, Handler, HandlerError, ToolDefinition, ToolRegistry, ToolSpec,
        ValidatedArgs,
    };
    use serde_json::json;

    struct EchoHandler;

    #[async_trait::async_trait]
    impl Handler for EchoHandler {
        async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
            Ok(Value::Object(args.into_inner()))
        }
    }

    fn state() -> Arc<AppState> {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new(
                ToolSpec::new("echo", "Echo arguments back"),
                Arc::new(EchoHandler),
            ))
            .unwrap();
        Arc::new(AppState {
            dispatcher: Arc::new(Dispatcher::new(Arc::new(registry))),
        })
    }

    #[tokio::test]
    async fn test_list_tools() {
        let Json(response) = list_tools(State(state())).await;
        assert_eq!(response.tools.len(), 1);
        assert_eq!(response.tools[0].name, "echo");
        assert_eq!(response.tools[0].input_schema["type"], "object");
    }

    #[tokio::test]
    async fn test_invoke_by_path() {
        let Json(envelope) =
            invoke_tool(State(state()), Path("echo".to_string()), Json(json!({}))).await;
        assert!(envelope.ok);
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_returns_envelope() {
        let Json(envelope) = invoke(
            State(state()),
            Json(InvokeRequest {
                tool: "frobnicate".to_string(),
                arguments: json!({}),
            }),
        )
        .await;

        assert!(!envelope.ok);
        assert_eq!(envelope.error_kind(), Some(ErrorKind::UnknownTool));
    }
}
