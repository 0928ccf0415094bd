//! The canonical response envelope.
//!
//! Every invocation, on every transport, resolves to exactly one of two
//! shapes: `{ok: true, data: <value>, error: null}` or
//! `{ok: false, data: null, error: {kind, message}}`. Callers never need to
//! type-sniff.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub data: Option<Value>,
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(EnvelopeError {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_round_trip() {
        let original = json!({"symbol": "AAPL", "price": 227.52});
        let envelope = Envelope::success(original.clone());

        assert!(envelope.ok);
        assert_eq!(envelope.data, Some(original));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_success_wire_shape() {
        let envelope = Envelope::success(json!([1, 2, 3]));
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire, json!({"ok": true, "data": [1, 2, 3], "error": null}));
    }

    #[test]
    fn test_failure_wire_shape() {
        let envelope = Envelope::failure(ErrorKind::UnknownTool, "unknown tool: frobnicate");
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            json!({
                "ok": false,
                "data": null,
                "error": {
                    "kind": "UnknownToolError",
                    "message": "unknown tool: frobnicate",
                },
            })
        );
    }

    #[test]
    fn test_scalar_data_preserved() {
        // Scalars pass through untouched, not wrapped in anything.
        let envelope = Envelope::success(json!(42));
        assert_eq!(envelope.data, Some(json!(42)));

        let envelope = Envelope::success(Value::Null);
        assert!(envelope.ok);
        assert_eq!(envelope.data, Some(Value::Null));
    }
}
