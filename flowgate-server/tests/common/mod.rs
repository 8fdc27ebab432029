#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use flowgate_core::{load_openapi_str, CompileMode, RouteTable};
use flowgate_exec::{
    CallError, CallHandler, CallOutput, Dispatcher, Engine, EngineConfig, HttpClient, HttpError,
    HttpRequestParts, HttpResponseParts, InboundCall, RawParams,
};
use flowgate_server::AppState;
use serde_json::{json, Value as JsonValue};

pub const ORDERS: &str = include_str!("../../../fixtures/orders.yaml");

/// Downstream stub: orders return a product id, products echo their sku.
#[derive(Default)]
pub struct OrdersDownstream {
    pub requests: Mutex<Vec<HttpRequestParts>>,
}

#[async_trait]
impl HttpClient for OrdersDownstream {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Duration,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        self.requests.lock().unwrap().push(req.clone());
        let path = req.url.path().to_string();
        let (status, ct, body) = if let Some(id) = path.strip_prefix("/orders/") {
            if id == "missing" {
                (404, "application/json", json!({"detail": "not found"}).to_string())
            } else {
                (200, "application/json", json!({"id": id, "product_id": "p1"}).to_string())
            }
        } else if let Some(sku) = path.strip_prefix("/products/") {
            (200, "application/json", json!({"sku": sku, "name": "Widget"}).to_string())
        } else if path == "/health" {
            (200, "text/plain", "up".to_string())
        } else {
            (404, "application/json", "{}".to_string())
        };
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), ct.to_string());
        Ok(HttpResponseParts {
            status,
            headers,
            body: body.into_bytes(),
        })
    }
}

pub fn orders_state() -> (AppState, Arc<OrdersDownstream>) {
    let config = load_openapi_str(ORDERS, CompileMode::Strict).unwrap().config;
    let routes = RouteTable::build(&config).unwrap();
    let http = Arc::new(OrdersDownstream::default());
    let engine = Engine::new(http.clone(), EngineConfig::default());
    let dispatcher = Dispatcher::new(Arc::new(config), engine);
    (AppState::new(Arc::new(dispatcher), routes), http)
}

/// Handler that records calls and answers after an optional delay.
#[derive(Default)]
pub struct ScriptedHandler {
    pub delay: Duration,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    pub calls: Mutex<Vec<InboundCall>>,
}

impl ScriptedHandler {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CallHandler for ScriptedHandler {
    async fn call(&self, call: InboundCall) -> Result<CallOutput, CallError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(call.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        match call.operation_id.as_str() {
            "echo" => {
                let params = match call.params {
                    RawParams::Flat(m) => JsonValue::Object(m),
                    RawParams::Rest { .. } => json!("rest"),
                };
                Ok(CallOutput::Json(json!({"params": params})))
            }
            other => Err(CallError::UnknownOperation(other.to_string())),
        }
    }

    fn operation_count(&self) -> usize {
        1
    }
}

pub fn scripted_state(handler: Arc<ScriptedHandler>) -> AppState {
    AppState::new(handler, RouteTable::default())
}

pub async fn body_json(resp: Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
