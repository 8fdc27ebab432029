use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowgate_exec::{CallHandler, InboundCall, InboundCredentials, RawParams};
use serde_json::{Map, Value as JsonValue};

use crate::app::AppState;
use crate::credentials;
use crate::error::rpc_error;
use crate::jsonrpc::{parse_request, JsonRpcError, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS};

/// Run one JSON-RPC request. `None` for notifications.
pub async fn dispatch(
    handler: &dyn CallHandler,
    req: JsonRpcRequest,
    credentials: InboundCredentials,
) -> Option<JsonRpcResponse> {
    let id = req.response_id();
    let notification = req.is_notification();
    let response = match flat_params(req.params) {
        Err(message) => JsonRpcResponse::failure(id, JsonRpcError::new(INVALID_PARAMS, message)),
        Ok(params) => {
            let call = InboundCall::new(req.method, RawParams::Flat(params)).with_credentials(credentials);
            match handler.call(call).await {
                Ok(out) => JsonRpcResponse::success(id, out.into_json()),
                Err(e) => JsonRpcResponse::failure(id, rpc_error(&e)),
            }
        }
    };
    (!notification).then_some(response)
}

pub(crate) fn flat_params(params: Option<JsonValue>) -> Result<Map<String, JsonValue>, String> {
    match params {
        None | Some(JsonValue::Null) => Ok(Map::new()),
        Some(JsonValue::Object(m)) => Ok(m),
        Some(_) => Err("params must be an object keyed by parameter name".to_string()),
    }
}

/// `POST /rpc`: one request, one response, no state between calls.
pub async fn rpc_handler(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(resp) => return Json(resp).into_response(),
    };
    let creds = credentials::from_request(&credentials::header_map(&headers), &BTreeMap::new());
    match dispatch(state.handler.as_ref(), req, creds).await {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}
