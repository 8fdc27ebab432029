use flowgate_core::Binding;

use crate::http::HttpResponseParts;

const EXCERPT_BYTES: usize = 512;

pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// Bind a successful response: JSON when declared and parseable, opaque otherwise.
pub(crate) fn decode(resp: HttpResponseParts) -> Binding {
    let content_type = resp.header("content-type").map(str::to_string);
    if content_type.as_deref().is_some_and(is_json_content_type) {
        if resp.body.iter().all(u8::is_ascii_whitespace) {
            return Binding::Json(serde_json::Value::Null);
        }
        if let Ok(v) = serde_json::from_slice(&resp.body) {
            return Binding::Json(v);
        }
    }
    Binding::Opaque {
        content_type,
        bytes: resp.body,
    }
}

pub(crate) fn excerpt(body: &[u8]) -> String {
    let end = body.len().min(EXCERPT_BYTES);
    String::from_utf8_lossy(&body[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_types() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/plain"));
        assert!(!is_json_content_type("text/json+html"));
    }
}
