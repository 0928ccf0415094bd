//! Tool dispatcher: lookup, validate, invoke under a deadline, normalize.
//!
//! The dispatcher is transport-agnostic: both the stdio MCP loop and the
//! HTTP bridge hand it a tool name plus raw arguments and forward the
//! envelope it returns. It holds no mutable state across calls, so a single
//! instance serves any number of concurrent invocations.

use crate::envelope::Envelope;
use crate::error::ErrorKind;
use crate::registry::ToolRegistry;
use crate::validate;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Default per-call deadline. Individual deployments override this through
/// configuration; handlers doing their own retries must fit inside it.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    deadline: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_deadline(registry: Arc<ToolRegistry>, deadline: Duration) -> Self {
        Self { registry, deadline }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool invocation end to end. Never panics past this boundary;
    /// every outcome is an envelope.
    ///
    /// On deadline expiry the handler future is dropped, which cancels it at
    /// its next await point; handlers owning subprocesses arm kill-on-drop so
    /// the work stops rather than running on unobserved. There are no
    /// automatic retries and no idempotency tracking: a timed-out mutation
    /// may or may not have taken effect upstream.
    pub async fn invoke(&self, tool: &str, raw_args: &Value) -> Envelope {
        let invocation_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("invoke", %tool, %invocation_id);
        self.invoke_inner(tool, raw_args).instrument(span).await
    }

    async fn invoke_inner(&self, tool: &str, raw_args: &Value) -> Envelope {
        let definition = match self.registry.lookup(tool) {
            Ok(def) => def,
            Err(err) => {
                tracing::warn!(%err, "lookup failed");
                return Envelope::failure(err.kind(), err.to_string());
            }
        };

        let args = match validate::validate(&definition.spec, raw_args) {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(%err, "validation failed");
                return Envelope::failure(err.kind(), err.to_string());
            }
        };

        let handler = definition.handler.clone();
        match tokio::time::timeout(self.deadline, handler.call(args)).await {
            Ok(Ok(data)) => {
                tracing::info!("invocation succeeded");
                Envelope::success(data)
            }
            Ok(Err(err)) => {
                let kind = err.kind();
                tracing::warn!(%err, %kind, "handler failed");
                Envelope::failure(kind, err.to_string())
            }
            Err(_) => {
                tracing::warn!(deadline_ms = self.deadline.as_millis() as u64, "deadline exceeded");
                Envelope::failure(
                    ErrorKind::Timeout,
                    format!(
                        "tool {tool} exceeded the {}ms deadline and was cancelled",
                        self.deadline.as_millis()
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::schema::{Handler, ParamSpec, ParamType, ToolDefinition, ToolSpec};
    use crate::validate::ValidatedArgs;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts calls and echoes its arguments back.
    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl Handler for CountingHandler {
        async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Object(args.into_inner()))
        }
    }

    /// Sleeps past any reasonable deadline; the drop guard records that
    /// cancellation actually reached the handler.
    struct SleepyHandler {
        cancelled: Arc<AtomicBool>,
    }

    struct CancelGuard {
        flag: Arc<AtomicBool>,
        completed: bool,
    }

    impl Drop for CancelGuard {
        fn drop(&mut self) {
            if !self.completed {
                self.flag.store(true, Ordering::SeqCst);
            }
        }
    }

    #[async_trait::async_trait]
    impl Handler for SleepyHandler {
        async fn call(&self, _args: ValidatedArgs) -> Result<Value, HandlerError> {
            let mut guard = CancelGuard {
                flag: self.cancelled.clone(),
                completed: false,
            };
            tokio::time::sleep(Duration::from_secs(3600)).await;
            guard.completed = true;
            Ok(Value::Null)
        }
    }

    struct FailingHandler {
        error: fn() -> HandlerError,
    }

    #[async_trait::async_trait]
    impl Handler for FailingHandler {
        async fn call(&self, _args: ValidatedArgs) -> Result<Value, HandlerError> {
            Err((self.error)())
        }
    }

    fn registry_with(definition: ToolDefinition) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(definition).unwrap();
        Arc::new(registry)
    }

    fn echo_spec() -> ToolSpec {
        ToolSpec::new("echo", "Echo validated arguments")
            .with_param(ParamSpec::required("message", ParamType::String, "Text to echo"))
    }

    #[tokio::test]
    async fn test_success_envelope_round_trip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(ToolDefinition::new(
            echo_spec(),
            Arc::new(CountingHandler { calls: calls.clone() }),
        ));
        let dispatcher = Dispatcher::new(registry);

        let envelope = dispatcher.invoke("echo", &json!({"message": "hi"})).await;

        assert!(envelope.ok);
        assert_eq!(envelope.data, Some(json!({"message": "hi"})));
        assert!(envelope.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_never_escapes() {
        let dispatcher = Dispatcher::new(Arc::new(ToolRegistry::new()));

        let envelope = dispatcher.invoke("frobnicate", &json!({})).await;

        assert!(!envelope.ok);
        assert_eq!(envelope.error_kind(), Some(ErrorKind::UnknownTool));
    }

    #[tokio::test]
    async fn test_validation_failure_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(ToolDefinition::new(
            echo_spec(),
            Arc::new(CountingHandler { calls: calls.clone() }),
        ));
        let dispatcher = Dispatcher::new(registry);

        let envelope = dispatcher.invoke("echo", &json!({})).await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::MissingParameter));

        let envelope = dispatcher.invoke("echo", &json!({"message": 7})).await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::InvalidParameterType));

        let envelope = dispatcher
            .invoke("echo", &json!({"message": "hi", "color": "red"}))
            .await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::UnexpectedParameter));

        // The handler was verifiably never reached.
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_handler() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let registry = registry_with(ToolDefinition::new(
            ToolSpec::new("slow", "Sleeps forever"),
            Arc::new(SleepyHandler { cancelled: cancelled.clone() }),
        ));
        let dispatcher =
            Dispatcher::with_deadline(registry, Duration::from_millis(50));

        let envelope = dispatcher.invoke("slow", &json!({})).await;

        assert_eq!(envelope.error_kind(), Some(ErrorKind::Timeout));
        // The drop guard inside the handler observed the cancellation.
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_handler_failure_classification() {
        let registry = {
            let mut registry = ToolRegistry::new();
            registry
                .register(ToolDefinition::new(
                    ToolSpec::new("down", "Always unavailable"),
                    Arc::new(FailingHandler {
                        error: || HandlerError::Unavailable("connect refused".to_string()),
                    }),
                ))
                .unwrap();
            registry
                .register(ToolDefinition::new(
                    ToolSpec::new("denied", "Always rejected"),
                    Arc::new(FailingHandler {
                        error: || HandlerError::Rejected("HTTP 404: no such symbol".to_string()),
                    }),
                ))
                .unwrap();
            registry
                .register(ToolDefinition::new(
                    ToolSpec::new("broken", "Always panicking inside"),
                    Arc::new(FailingHandler {
                        error: || HandlerError::Internal(anyhow::anyhow!("index out of range")),
                    }),
                ))
                .unwrap();
            Arc::new(registry)
        };
        let dispatcher = Dispatcher::new(registry);

        let envelope = dispatcher.invoke("down", &json!({})).await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::UpstreamUnavailable));

        let envelope = dispatcher.invoke("denied", &json!({})).await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::UpstreamRejected));
        // Raw diagnostics ride along in the message, never replacing the kind.
        assert!(envelope.error.unwrap().message.contains("404"));

        let envelope = dispatcher.invoke("broken", &json!({})).await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::Internal));
    }
}
