//! REST surface: every OpenAPI route, served by one fallback handler.

use std::collections::BTreeMap;

use axum::body::{to_bytes, Body};
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowgate_core::RouteMatch;
use flowgate_exec::{CallHandler, CallOutput, InboundCall, RawParams};
use serde_json::{json, Value as JsonValue};

use crate::app::AppState;
use crate::credentials;
use crate::error::{http_status, rest_error_body};

const MAX_REQUEST_BYTES: usize = 2 * 1024 * 1024;

pub async fn rest_handler(State(state): State<AppState>, req: Request) -> Response {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    let (operation_id, captures) = match state.routes.lookup(&method, &path) {
        RouteMatch::Found {
            operation_id,
            params,
        } => (operation_id, params),
        RouteMatch::MethodNotAllowed { allowed } => {
            let mut resp = plain_error(
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                format!("{method} is not allowed on {path}"),
            );
            if let Ok(v) = HeaderValue::from_str(&allowed.join(", ")) {
                resp.headers_mut().insert(header::ALLOW, v);
            }
            return resp;
        }
        RouteMatch::NotFound => {
            return plain_error(StatusCode::NOT_FOUND, "not_found", format!("no route for {path}"))
        }
    };

    let mut path_params = BTreeMap::new();
    for (name, raw) in captures {
        match urlencoding::decode(&raw) {
            Ok(v) => path_params.insert(name, v.into_owned()),
            Err(_) => {
                return plain_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_params",
                    format!("path parameter '{name}' is not valid UTF-8"),
                )
            }
        };
    }
    let query = Query::<BTreeMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let headers = credentials::header_map(req.headers());

    let bytes = match to_bytes(req.into_body(), MAX_REQUEST_BYTES).await {
        Ok(b) => b,
        Err(_) => {
            return plain_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "request body exceeds limit".to_string(),
            )
        }
    };
    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(v) => Some(v),
            Err(e) => {
                return plain_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_params",
                    format!("request body is not valid JSON: {e}"),
                )
            }
        }
    };

    let creds = credentials::from_request(&headers, &query);
    let call = InboundCall::new(
        operation_id,
        RawParams::Rest {
            path: path_params,
            query,
            headers,
            body,
        },
    )
    .with_credentials(creds);

    match state.handler.call(call).await {
        Ok(CallOutput::Json(v)) => (StatusCode::OK, Json(v)).into_response(),
        Ok(CallOutput::Opaque {
            content_type,
            bytes,
        }) => {
            let ct = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
            let mut resp = Response::new(Body::from(bytes));
            if let Ok(v) = HeaderValue::from_str(&ct) {
                resp.headers_mut().insert(header::CONTENT_TYPE, v);
            }
            resp
        }
        Err(e) => (http_status(&e), Json(rest_error_body(&e))).into_response(),
    }
}

fn plain_error(status: StatusCode, code: &str, message: String) -> Response {
    (status, Json(json!({"error": {"code": code, "message": message}}))).into_response()
}
