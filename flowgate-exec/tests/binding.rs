mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::{dispatcher, header, json, MockHttp};
use flowgate_core::{load_openapi_str, CompileMode};
use flowgate_exec::{
    CallError, CallHandler, CallOutput, Dispatcher, Engine, EngineConfig, InboundCall,
    InboundCredentials, ParamError, RawParams,
};
use serde_json::json;

fn bearer() -> InboundCredentials {
    InboundCredentials::new().with_header("Authorization", "Bearer tok-1")
}

fn create_mock() -> MockHttp {
    MockHttp::new()
        .route("/orders/O-77/confirm", |_| Ok(json(200, json!({"confirmed": true}))))
        .route("/orders", |_| Ok(json(201, json!({"id": "O-77", "state": "new"}))))
}

fn flat(v: serde_json::Value) -> RawParams {
    RawParams::Flat(v.as_object().cloned().unwrap())
}

#[tokio::test]
async fn body_params_are_coerced_and_omitted_optionals_pruned() {
    let http = Arc::new(create_mock());
    let d = dispatcher(http.clone(), EngineConfig::default());

    let out = d
        .call(
            InboundCall::new("create_order", flat(json!({"product_id": "P-1", "quantity": "3"})))
                .with_credentials(bearer()),
        )
        .await
        .unwrap();
    // response_step points at the first step even though both ran.
    assert_eq!(out, CallOutput::Json(json!({"id": "O-77", "state": "new"})));

    let sent = http.recorded();
    assert_eq!(sent.len(), 2);
    let body: serde_json::Value = serde_json::from_slice(&sent[0].body).unwrap();
    assert_eq!(body, json!({"product_id": "P-1", "quantity": 3}));
    assert_eq!(header(&sent[0], "content-type"), Some("application/json"));
    assert_eq!(header(&sent[0], "X-Request-Source"), Some("gateway"));
    assert_eq!(header(&sent[0], "Authorization"), Some("Bearer tok-1"));
    assert_eq!(sent[1].url.path(), "/orders/O-77/confirm");
}

#[tokio::test]
async fn invalid_params_fail_before_any_request() {
    let http = Arc::new(create_mock());
    let d = dispatcher(http.clone(), EngineConfig::default());

    let err = d
        .call(InboundCall::new("create_order", flat(json!({}))).with_credentials(bearer()))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::InvalidParams(ParamError::Missing { .. })));

    let err = d
        .call(
            InboundCall::new("create_order", flat(json!({"product_id": "P", "quantity": "many"})))
                .with_credentials(bearer()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::InvalidParams(ParamError::Coercion { .. })));
    assert!(http.recorded().is_empty());
}

#[tokio::test]
async fn wrong_authorization_scheme_counts_as_missing() {
    let http = Arc::new(create_mock());
    let d = dispatcher(http.clone(), EngineConfig::default());
    let err = d
        .call(
            InboundCall::new("create_order", flat(json!({"product_id": "P", "quantity": 1})))
                .with_credentials(InboundCredentials::new().with_header("authorization", "Basic Zm9vOmJhcg==")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::Credential(_)));
    assert!(http.recorded().is_empty());
}

const QUERY_KEY: &str = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
components:
  securitySchemes:
    Key:
      type: apiKey
      in: query
      name: api_key
security:
  - Key: []
paths:
  /search:
    get:
      operationId: search
      parameters:
        - { name: q, in: query, required: true, schema: { type: string } }
        - { name: limit, in: query, schema: { type: integer } }
      x-mcp-source:
        type: http
        steps:
          - step_id: search
            method: GET
            url: https://search.example.com/v1?q=${query_params.q}
  /pinned:
    get:
      operationId: pinned
      x-mcp-source:
        type: http
        steps:
          - step_id: pinned
            method: GET
            url: https://search.example.com/pinned?api_key=fixed
"#;

fn query_dispatcher(http: Arc<MockHttp>) -> Dispatcher {
    let config = load_openapi_str(QUERY_KEY, CompileMode::Strict).unwrap().config;
    Dispatcher::new(Arc::new(config), Engine::new(http, EngineConfig::default()))
}

#[tokio::test]
async fn query_api_key_falls_back_to_header_and_explicit_query_wins() {
    let http = Arc::new(
        MockHttp::new()
            .route("/v1", |_| Ok(json(200, json!([]))))
            .route("/pinned", |_| Ok(json(200, json!({})))),
    );
    let d = query_dispatcher(http.clone());
    let creds = InboundCredentials::new().with_header("api_key", "from-header");

    d.call(InboundCall::new("search", flat(json!({"q": "shoes"}))).with_credentials(creds.clone()))
        .await
        .unwrap();
    d.call(InboundCall::new("pinned", RawParams::default()).with_credentials(creds))
        .await
        .unwrap();

    let sent = http.recorded();
    let pairs: Vec<(String, String)> = sent[0].url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("q".to_string(), "shoes".to_string())));
    assert!(pairs.contains(&("api_key".to_string(), "from-header".to_string())));
    let pinned: Vec<(String, String)> = sent[1].url.query_pairs().into_owned().collect();
    assert_eq!(pinned, vec![("api_key".to_string(), "fixed".to_string())]);
}

#[tokio::test]
async fn integer_query_param_is_coerced() {
    let op = load_openapi_str(QUERY_KEY, CompileMode::Strict)
        .unwrap()
        .config
        .get("search")
        .unwrap()
        .clone();
    let mut query = BTreeMap::new();
    query.insert("q".to_string(), "x".to_string());
    query.insert("limit".to_string(), "25".to_string());
    let raw = RawParams::Rest {
        path: BTreeMap::new(),
        query,
        headers: BTreeMap::new(),
        body: None,
    };
    let bound = flowgate_exec::bind_params(&op.spec, &raw).unwrap();
    assert_eq!(bound[&flowgate_core::ParamLocation::Query]["limit"], json!(25));
}

const SCHEMES: &str = r#"
openapi: 3.0.3
info: { title: t, version: "1" }
components:
  securitySchemes:
    Basic:
      type: http
      scheme: basic
    OAuth:
      type: oauth2
      flows:
        clientCredentials:
          tokenUrl: https://auth.example.com/token
          scopes: {}
    Key:
      type: apiKey
      in: header
      name: X-API-Key
paths:
  /register:
    post:
      operationId: register
      security:
        - Basic: []
      requestBody:
        content:
          application/json:
            schema:
              type: object
              required: [name]
              properties:
                name: { type: string }
                address:
                  type: object
                  properties:
                    city: { type: string }
      x-mcp-source:
        type: http
        steps:
          - step_id: register
            method: POST
            url: https://people.example.com/register
            body: ${body_params}
  /me:
    get:
      operationId: me
      security:
        - OAuth: []
      x-mcp-source:
        type: http
        steps:
          - step_id: me
            method: GET
            url: https://people.example.com/me
  /pinned:
    get:
      operationId: pinned_key
      security:
        - Key: []
      x-mcp-source:
        type: http
        steps:
          - step_id: pinned
            method: GET
            url: https://people.example.com/pinned
            headers:
              X-API-Key: fixed
"#;

fn people() -> (Arc<MockHttp>, Dispatcher) {
    let http = Arc::new(MockHttp::new().route("/", |_| Ok(json(200, json!({"ok": true})))));
    let config = load_openapi_str(SCHEMES, CompileMode::Strict).unwrap().config;
    let d = Dispatcher::new(Arc::new(config), Engine::new(http.clone(), EngineConfig::default()));
    (http, d)
}

fn basic() -> InboundCredentials {
    InboundCredentials::new().with_header("Authorization", "Basic Zm9vOmJhcg==")
}

#[tokio::test]
async fn rest_and_rpc_send_the_same_body() {
    let (http, d) = people();
    let payload = json!({"name": "n", "address": {"city": "c"}, "extra": 1});

    let rest = RawParams::Rest {
        path: BTreeMap::new(),
        query: BTreeMap::new(),
        headers: BTreeMap::new(),
        body: Some(payload.clone()),
    };
    d.call(InboundCall::new("register", rest).with_credentials(basic()))
        .await
        .unwrap();
    d.call(InboundCall::new("register", flat(payload)).with_credentials(basic()))
        .await
        .unwrap();

    let sent = http.recorded();
    let rest_body: serde_json::Value = serde_json::from_slice(&sent[0].body).unwrap();
    let rpc_body: serde_json::Value = serde_json::from_slice(&sent[1].body).unwrap();
    assert_eq!(rest_body, rpc_body);
    assert_eq!(rest_body, json!({"name": "n", "address": {"city": "c"}}));
}

#[tokio::test]
async fn basic_and_oauth2_credentials_are_forwarded_verbatim() {
    let (http, d) = people();
    d.call(InboundCall::new("register", flat(json!({"name": "n"}))).with_credentials(basic()))
        .await
        .unwrap();
    d.call(
        InboundCall::new("me", RawParams::default())
            .with_credentials(InboundCredentials::new().with_header("authorization", "Bearer tok")),
    )
    .await
    .unwrap();

    let sent = http.recorded();
    assert_eq!(header(&sent[0], "Authorization"), Some("Basic Zm9vOmJhcg=="));
    assert_eq!(header(&sent[1], "Authorization"), Some("Bearer tok"));

    let err = d
        .call(InboundCall::new("me", RawParams::default()).with_credentials(basic()))
        .await
        .unwrap_err();
    assert!(matches!(err, CallError::Credential(_)));
    assert_eq!(http.recorded().len(), 2);
}

#[tokio::test]
async fn explicit_step_header_beats_forwarded_api_key() {
    let (http, d) = people();
    d.call(
        InboundCall::new("pinned_key", RawParams::default())
            .with_credentials(InboundCredentials::new().with_header("x-api-key", "from-caller")),
    )
    .await
    .unwrap();

    let sent = http.recorded();
    assert_eq!(header(&sent[0], "X-API-Key"), Some("fixed"));
    let keys = sent[0]
        .headers
        .keys()
        .filter(|k| k.eq_ignore_ascii_case("x-api-key"))
        .count();
    assert_eq!(keys, 1);
}
