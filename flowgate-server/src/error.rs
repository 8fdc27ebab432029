use axum::http::StatusCode;
use flowgate_exec::CallError;
use serde_json::{json, Map, Value as JsonValue};

use crate::jsonrpc::{
    JsonRpcError, DEADLINE_EXCEEDED, INVALID_PARAMS, METHOD_NOT_FOUND, MISSING_CREDENTIAL,
    OVERLOADED, STEP_FAILED,
};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn http_status(err: &CallError) -> StatusCode {
    match err {
        CallError::UnknownOperation(_) => StatusCode::NOT_FOUND,
        CallError::InvalidParams(_) => StatusCode::BAD_REQUEST,
        CallError::Credential(_) => StatusCode::UNAUTHORIZED,
        CallError::Step(_) => StatusCode::BAD_GATEWAY,
        CallError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        CallError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn rpc_code(err: &CallError) -> i64 {
    match err {
        CallError::UnknownOperation(_) => METHOD_NOT_FOUND,
        CallError::InvalidParams(_) => INVALID_PARAMS,
        CallError::Credential(_) => MISSING_CREDENTIAL,
        CallError::Step(_) => STEP_FAILED,
        CallError::DeadlineExceeded { .. } => DEADLINE_EXCEEDED,
        CallError::Overloaded => OVERLOADED,
    }
}

/// `step_id` and downstream `status`, when the error has them.
fn error_details(err: &CallError) -> Map<String, JsonValue> {
    let mut data = Map::new();
    if let Some(step_id) = err.step_id() {
        data.insert("step_id".to_string(), json!(step_id));
    }
    if let Some(status) = err.downstream_status() {
        data.insert("status".to_string(), json!(status));
    }
    data
}

pub fn rpc_error(err: &CallError) -> JsonRpcError {
    let data = error_details(err);
    JsonRpcError {
        code: rpc_code(err),
        message: err.to_string(),
        data: (!data.is_empty()).then_some(JsonValue::Object(data)),
    }
}

/// REST error body: `{"error": {"code", "message", "step_id"?, "status"?}}`.
pub fn rest_error_body(err: &CallError) -> JsonValue {
    let mut body = Map::new();
    body.insert("code".to_string(), json!(err.code()));
    body.insert("message".to_string(), json!(err.to_string()));
    body.extend(error_details(err));
    json!({ "error": body })
}

#[cfg(test)]
mod tests {
    use flowgate_exec::{HttpError, RequestSummary, StepExecutionError, StepFailure};

    use super::*;

    #[test]
    fn step_errors_carry_step_and_status() {
        let err = CallError::Step(StepExecutionError {
            step_id: "fetch_order".to_string(),
            request: RequestSummary {
                method: "GET".to_string(),
                url: "https://x/orders/1".to_string(),
            },
            failure: StepFailure::Status {
                status: 404,
                body_excerpt: String::new(),
            },
        });
        assert_eq!(http_status(&err), StatusCode::BAD_GATEWAY);
        let rpc = rpc_error(&err);
        assert_eq!(rpc.code, STEP_FAILED);
        assert_eq!(rpc.data, Some(json!({"step_id": "fetch_order", "status": 404})));

        let timeout = CallError::Step(StepExecutionError {
            step_id: "s".to_string(),
            request: RequestSummary {
                method: "GET".to_string(),
                url: "https://x".to_string(),
            },
            failure: StepFailure::Transport(HttpError::Timeout),
        });
        assert_eq!(rest_error_body(&timeout)["error"]["step_id"], "s");
        assert!(rest_error_body(&timeout)["error"].get("status").is_none());
    }
}
