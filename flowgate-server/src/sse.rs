//! JSON-RPC over a persistent server-sent-events stream.

use std::collections::BTreeMap;
use std::convert::Infallible;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowgate_exec::{CallHandler, InboundCall, RawParams};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::app::AppState;
use crate::credentials;
use crate::error::rpc_error;
use crate::jsonrpc::parse_request;
use crate::rpc::dispatch;
use crate::session::SessionGuard;

const SESSION_BUFFER: usize = 64;

/// `GET /sse`: open a session and announce where to post requests.
pub async fn connect(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session, receiver) = state.sessions.open(SESSION_BUFFER);
    tracing::info!(session_id = %session.id, "sse session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={}", session.id));
    let guard = SessionGuard {
        id: session.id,
        registry: state.sessions.clone(),
    };
    let messages = stream::unfold((receiver, guard), |(mut rx, guard)| async move {
        let msg = rx.recv().await?;
        Some((Event::default().event("message").data(msg), (rx, guard)))
    });

    let events = stream::once(async move { endpoint }).chain(messages).map(Ok);
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    session_id: String,
}

/// `POST /messages?session_id=..`: accept a request; the response arrives on the stream.
pub async fn post_message(
    State(state): State<AppState>,
    Query(q): Query<MessageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session = Uuid::parse_str(&q.session_id)
        .ok()
        .and_then(|id| state.sessions.get(&id));
    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": "unknown_session", "message": "no such session"}})),
        )
            .into_response();
    };

    let req = match parse_request(&body) {
        Ok(req) => req,
        Err(resp) => {
            let _ = session.sender.send(resp.to_json_string()).await;
            return StatusCode::ACCEPTED.into_response();
        }
    };
    if !session.begin() {
        return StatusCode::GONE.into_response();
    }

    let creds = credentials::from_request(&credentials::header_map(&headers), &BTreeMap::new());
    let handler = state.handler.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = session.token.cancelled() => {
                tracing::debug!(session_id = %session.id, "call cancelled with its session");
            }
            resp = dispatch(handler.as_ref(), req, creds) => {
                // Late results for a closed session are dropped.
                if session.finish() {
                    if let Some(resp) = resp {
                        let _ = session.sender.send(resp.to_json_string()).await;
                    }
                }
            }
        }
    });
    StatusCode::ACCEPTED.into_response()
}

/// `GET /events?op=<operationId>&...`: one call, one event, end of stream.
pub async fn one_shot(
    State(state): State<AppState>,
    Query(mut query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let Some(op) = query.remove("op") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": "invalid_params", "message": "missing 'op' query parameter"}})),
        )
            .into_response();
    };
    let creds = credentials::from_request(&credentials::header_map(&headers), &query);
    let params = query
        .into_iter()
        .map(|(k, v)| (k, JsonValue::String(v)))
        .collect();

    let result = state
        .handler
        .call(InboundCall::new(op, RawParams::Flat(params)).with_credentials(creds))
        .await;
    let event = match result {
        Ok(out) => Event::default().event("message").data(out.into_json().to_string()),
        Err(e) => Event::default()
            .event("error")
            .data(serde_json::to_string(&rpc_error(&e)).unwrap_or_default()),
    };
    Sse::new(stream::once(async move { Ok::<_, Infallible>(event) })).into_response()
}
