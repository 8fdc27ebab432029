//! JSON-RPC 2.0 envelope shared by the `/rpc`, SSE and line-channel transports.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const MISSING_CREDENTIAL: i64 = -32001;
pub const STEP_FAILED: i64 = -32002;
pub const DEADLINE_EXCEEDED: i64 = -32003;
pub const OVERLOADED: i64 = -32004;

/// A well-formed request. `id: None` marks a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Option<JsonValue>,
    pub method: String,
    pub params: Option<JsonValue>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id echoed in responses; notifications and explicit nulls both map to `null`.
    pub fn response_id(&self) -> JsonValue {
        self.id.clone().unwrap_or(JsonValue::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: JsonValue,
}

impl JsonRpcResponse {
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: JsonValue, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            json!({
                "jsonrpc": JSONRPC_VERSION,
                "error": {"code": -32603, "message": "failed to encode response"},
                "id": null
            })
            .to_string()
        })
    }
}

/// Parse raw bytes into a request, or the error response to send instead.
pub fn parse_request(bytes: &[u8]) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: JsonValue = serde_json::from_slice(bytes).map_err(|e| {
        JsonRpcResponse::failure(
            JsonValue::Null,
            JsonRpcError::new(PARSE_ERROR, format!("parse error: {e}")),
        )
    })?;
    request_from_value(value)
}

pub fn request_from_value(value: JsonValue) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let JsonValue::Object(mut obj) = value else {
        return Err(invalid(JsonValue::Null, "request must be a JSON object"));
    };
    let id = obj.remove("id");
    let echo = id.clone().unwrap_or(JsonValue::Null);
    if !matches!(
        id,
        None | Some(JsonValue::Null | JsonValue::String(_) | JsonValue::Number(_))
    ) {
        return Err(invalid(JsonValue::Null, "id must be a string, number or null"));
    }
    if obj.get("jsonrpc").and_then(|v| v.as_str()) != Some(JSONRPC_VERSION) {
        return Err(invalid(echo, "jsonrpc must be \"2.0\""));
    }
    let method = match obj.remove("method") {
        Some(JsonValue::String(m)) if !m.is_empty() => m,
        _ => return Err(invalid(echo, "method must be a non-empty string")),
    };
    Ok(JsonRpcRequest {
        id,
        method,
        params: obj.remove("params"),
    })
}

fn invalid(id: JsonValue, message: &str) -> JsonRpcResponse {
    JsonRpcResponse::failure(id, JsonRpcError::new(INVALID_REQUEST, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_envelopes() {
        assert_eq!(
            parse_request(b"{not json").unwrap_err().error.unwrap().code,
            PARSE_ERROR
        );
        let err = parse_request(br#"{"jsonrpc":"1.0","method":"m","id":7}"#).unwrap_err();
        assert_eq!(err.error.unwrap().code, INVALID_REQUEST);
        assert_eq!(err.id, json!(7));

        let req = parse_request(br#"{"jsonrpc":"2.0","method":"m","params":{"a":1}}"#).unwrap();
        assert!(req.is_notification());
        assert_eq!(req.params, Some(json!({"a": 1})));
    }

    #[test]
    fn success_serializes_null_results() {
        let r = JsonRpcResponse::success(json!(1), JsonValue::Null);
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"jsonrpc": "2.0", "result": null, "id": 1})
        );
    }
}
