//! Request validation: raw JSON arguments against a declared schema.
//!
//! Pure and side-effect-free. The handler never sees a request that has not
//! passed through here, and validation itself never touches the network.

use crate::error::ValidationError;
use crate::schema::{ParamType, ToolSpec};
use serde_json::{Map, Value};

/// Type-checked, defaulted argument set produced by [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs {
    values: Map<String, Value>,
}

impl ValidatedArgs {
    /// An empty argument set, for tools that declare no parameters.
    pub fn empty() -> Self {
        Self { values: Map::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn list(&self, name: &str) -> Option<&Vec<Value>> {
        self.values.get(name).and_then(Value::as_array)
    }

    pub fn mapping(&self, name: &str) -> Option<&Map<String, Value>> {
        self.values.get(name).and_then(Value::as_object)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.values
    }
}

/// Validate raw arguments against a tool's declared parameters.
///
/// Rules, applied per declared parameter:
/// - absent and required: `MissingParameter`
/// - absent and optional: the declared default is substituted (if any)
/// - present but not coercible to the declared type: `InvalidParameterType`
///
/// Parameters not present in the schema fail closed with
/// `UnexpectedParameter`.
pub fn validate(spec: &ToolSpec, raw: &Value) -> Result<ValidatedArgs, ValidationError> {
    let empty = Map::new();
    let raw = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => return Err(ValidationError::ArgumentsNotAnObject),
    };

    // Fail closed on anything the schema does not declare.
    for name in raw.keys() {
        if !spec.params.iter().any(|p| &p.name == name) {
            return Err(ValidationError::UnexpectedParameter { name: name.clone() });
        }
    }

    let mut values = Map::new();
    for param in &spec.params {
        match raw.get(&param.name) {
            Some(value) => {
                let coerced = coerce(value, param.param_type).ok_or_else(|| {
                    ValidationError::InvalidParameterType {
                        name: param.name.clone(),
                        expected: param.param_type.as_str(),
                        actual: type_name(value).to_string(),
                    }
                })?;
                values.insert(param.name.clone(), coerced);
            }
            None if param.required => {
                return Err(ValidationError::MissingParameter {
                    name: param.name.clone(),
                });
            }
            None => {
                if let Some(default) = &param.default {
                    values.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(ValidatedArgs { values })
}

/// Coerce a supplied value to the declared type. Numbers additionally accept
/// numeric strings; everything else must match exactly.
fn coerce(value: &Value, ty: ParamType) -> Option<Value> {
    match (ty, value) {
        (ParamType::String, Value::String(_)) => Some(value.clone()),
        (ParamType::Number, Value::Number(_)) => Some(value.clone()),
        (ParamType::Number, Value::String(s)) => {
            s.trim().parse::<f64>().ok().and_then(|n| {
                serde_json::Number::from_f64(n).map(Value::Number)
            })
        }
        (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParamType::List, Value::Array(_)) => Some(value.clone()),
        (ParamType::Mapping, Value::Object(_)) => Some(value.clone()),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
