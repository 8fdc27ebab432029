use std::collections::BTreeMap;

use axum::http::HeaderMap;
use flowgate_exec::InboundCredentials;
use serde_json::{Map, Value as JsonValue};

/// Key a line-channel caller uses to pass credential headers inside `params`.
pub const AUTH_HEADERS_KEY: &str = "__auth_headers__";

pub fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_ascii_lowercase(), v.to_str().ok()?.to_string())))
        .collect()
}

pub fn from_request(
    headers: &BTreeMap<String, String>,
    query: &BTreeMap<String, String>,
) -> InboundCredentials {
    let mut creds = InboundCredentials::new();
    for (k, v) in headers {
        creds.insert_header(k, v.as_str());
    }
    for (k, v) in query {
        creds = creds.with_query(k, v.as_str());
    }
    creds
}

/// Remove `__auth_headers__` from JSON-RPC params and turn it into credentials.
pub fn take_auth_headers(params: &mut Map<String, JsonValue>) -> InboundCredentials {
    let mut creds = InboundCredentials::new();
    if let Some(JsonValue::Object(headers)) = params.remove(AUTH_HEADERS_KEY) {
        for (k, v) in headers {
            if let JsonValue::String(s) = v {
                creds.insert_header(&k, s);
            }
        }
    }
    creds
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_headers_are_stripped_from_params() {
        let mut params = json!({"order_id": "1", "__auth_headers__": {"X-API-Key": "k"}})
            .as_object()
            .cloned()
            .unwrap();
        let creds = take_auth_headers(&mut params);
        assert!(!params.contains_key(AUTH_HEADERS_KEY));
        assert_eq!(creds.header("x-api-key").map(|v| v.expose()), Some("k"));
    }
}
