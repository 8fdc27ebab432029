//! Binding inbound call parameters to the operation's declared parameters.

use std::collections::BTreeMap;

use flowgate_core::{OperationSpec, ParamLocation, ParamSpec, ParamType};
use serde_json::{Map, Value as JsonValue};

/// Parameters as an adapter received them, before declaration-driven binding.
#[derive(Debug, Clone)]
pub enum RawParams {
    /// REST: path captures, query pairs, headers and the JSON body.
    Rest {
        path: BTreeMap<String, String>,
        query: BTreeMap<String, String>,
        headers: BTreeMap<String, String>,
        body: Option<JsonValue>,
    },
    /// JSON-RPC: one flat object keyed by parameter name.
    Flat(Map<String, JsonValue>),
}

impl Default for RawParams {
    fn default() -> Self {
        RawParams::Flat(Map::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("missing required {location} parameter '{name}'")]
    Missing { location: &'static str, name: String },
    #[error("{location} parameter '{name}' must be {expected}")]
    Coercion {
        location: &'static str,
        name: String,
        expected: &'static str,
    },
    #[error("request body is required")]
    MissingBody,
    #[error("request body must be a JSON object")]
    BodyNotObject,
}

pub type BoundParams = BTreeMap<ParamLocation, Map<String, JsonValue>>;

/// Select, coerce and check every declared parameter of `op`.
///
/// Only declared parameters are bound, whatever the adapter: undeclared body
/// members and extra JSON-RPC params never reach a template.
pub fn bind_params(op: &OperationSpec, raw: &RawParams) -> Result<BoundParams, ParamError> {
    let mut out = BoundParams::new();
    for loc in ParamLocation::ALL {
        out.insert(loc, Map::new());
    }

    for spec in &op.parameters {
        let value = match (raw, spec.location) {
            (RawParams::Rest { body, .. }, ParamLocation::Body) => match body {
                Some(JsonValue::Object(obj)) => obj.get(&spec.name).cloned(),
                Some(JsonValue::Null) | None => None,
                Some(_) => return Err(ParamError::BodyNotObject),
            },
            (RawParams::Rest { path, .. }, ParamLocation::Path) => {
                path.get(&spec.name).cloned().map(JsonValue::String)
            }
            (RawParams::Rest { query, .. }, ParamLocation::Query) => {
                query.get(&spec.name).cloned().map(JsonValue::String)
            }
            (RawParams::Rest { headers, .. }, ParamLocation::Header) => headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&spec.name))
                .map(|(_, v)| JsonValue::String(v.clone())),
            (RawParams::Flat(map), _) => map.get(&spec.name).cloned(),
        };

        match value.filter(|v| !v.is_null()) {
            Some(v) => {
                let coerced = coerce(&v, spec.param_type).ok_or_else(|| ParamError::Coercion {
                    location: spec.location.as_str(),
                    name: spec.name.clone(),
                    expected: type_name(spec.param_type),
                })?;
                if let Some(m) = out.get_mut(&spec.location) {
                    m.insert(spec.name.clone(), coerced);
                }
            }
            None if spec.required => return Err(missing(spec)),
            None => {}
        }
    }

    if op.body_required && !has_body(op, raw) {
        return Err(ParamError::MissingBody);
    }
    Ok(out)
}

fn has_body(op: &OperationSpec, raw: &RawParams) -> bool {
    match raw {
        RawParams::Rest { body, .. } => body.as_ref().is_some_and(|b| !b.is_null()),
        RawParams::Flat(map) => {
            let mut body_params = op.params_in(ParamLocation::Body).peekable();
            // Nothing to pick from: a declared-but-schemaless body can't be checked.
            body_params.peek().is_none()
                || body_params.any(|p| map.get(&p.name).is_some_and(|v| !v.is_null()))
        }
    }
}

fn missing(spec: &ParamSpec) -> ParamError {
    ParamError::Missing {
        location: spec.location.as_str(),
        name: spec.name.clone(),
    }
}

fn type_name(t: ParamType) -> &'static str {
    match t {
        ParamType::String => "a string",
        ParamType::Integer => "an integer",
        ParamType::Number => "a number",
        ParamType::Boolean => "a boolean",
        ParamType::Object => "an object",
        ParamType::Array => "an array",
    }
}

/// Convert a received value to the declared type; `None` when it cannot be.
pub fn coerce(value: &JsonValue, ty: ParamType) -> Option<JsonValue> {
    match (ty, value) {
        (ParamType::String, JsonValue::String(_)) => Some(value.clone()),
        (ParamType::String, JsonValue::Number(n)) => Some(JsonValue::String(n.to_string())),
        (ParamType::String, JsonValue::Bool(b)) => Some(JsonValue::String(b.to_string())),
        (ParamType::String, _) => None,

        (ParamType::Integer, JsonValue::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(value.clone())
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| JsonValue::from(f as i64))
            }
        }
        (ParamType::Integer, JsonValue::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(JsonValue::from)
                .or_else(|_| s.parse::<u64>().map(JsonValue::from))
                .ok()
        }
        (ParamType::Integer, _) => None,

        (ParamType::Number, JsonValue::Number(_)) => Some(value.clone()),
        (ParamType::Number, JsonValue::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(JsonValue::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(JsonValue::Number)
        }
        (ParamType::Number, _) => None,

        (ParamType::Boolean, JsonValue::Bool(_)) => Some(value.clone()),
        (ParamType::Boolean, JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            _ => None,
        },
        (ParamType::Boolean, _) => None,

        (ParamType::Object, JsonValue::Object(_)) => Some(value.clone()),
        (ParamType::Array, JsonValue::Array(_)) => Some(value.clone()),
        (ParamType::Object | ParamType::Array, JsonValue::String(s)) => {
            let parsed: JsonValue = serde_json::from_str(s).ok()?;
            let ok = match ty {
                ParamType::Object => parsed.is_object(),
                _ => parsed.is_array(),
            };
            ok.then_some(parsed)
        }
        (ParamType::Object | ParamType::Array, _) => None,
    }
}
