#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flowgate_core::{load_openapi_str, CompileMode, GatewayConfig};
use flowgate_exec::{
    Dispatcher, Engine, EngineConfig, HttpClient, HttpError, HttpRequestParts, HttpResponseParts,
};

pub const ORDERS: &str = include_str!("../../../fixtures/orders.yaml");

pub fn orders_config() -> Arc<GatewayConfig> {
    Arc::new(load_openapi_str(ORDERS, CompileMode::Strict).unwrap().config)
}

pub fn json(status: u16, body: serde_json::Value) -> HttpResponseParts {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    HttpResponseParts {
        status,
        headers,
        body: body.to_string().into_bytes(),
    }
}

pub fn text(status: u16, body: &str) -> HttpResponseParts {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "text/plain".to_string());
    HttpResponseParts {
        status,
        headers,
        body: body.as_bytes().to_vec(),
    }
}

type Responder = Box<dyn Fn(&HttpRequestParts) -> Result<HttpResponseParts, HttpError> + Send + Sync>;

/// Records every request and answers from the first route whose path prefix matches.
pub struct MockHttp {
    routes: Vec<(String, Responder)>,
    delay: Duration,
    pub requests: Mutex<Vec<HttpRequestParts>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(
        mut self,
        path_prefix: &str,
        f: impl Fn(&HttpRequestParts) -> Result<HttpResponseParts, HttpError> + Send + Sync + 'static,
    ) -> Self {
        self.routes.push((path_prefix.to_string(), Box::new(f)));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn recorded(&self) -> Vec<HttpRequestParts> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Duration,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        self.requests.lock().unwrap().push(req.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let path = req.url.path().to_string();
        for (prefix, f) in &self.routes {
            if path.starts_with(prefix.as_str()) {
                return f(&req);
            }
        }
        Ok(json(404, serde_json::json!({"error": "no route"})))
    }
}

pub fn dispatcher(http: Arc<MockHttp>, config: EngineConfig) -> Dispatcher {
    Dispatcher::new(orders_config(), Engine::new(http, config))
}

pub fn header<'a>(req: &'a HttpRequestParts, name: &str) -> Option<&'a str> {
    req.headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
