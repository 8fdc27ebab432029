use std::collections::BTreeMap;

pub const REDACTED: &str = "<redacted>";

const ALWAYS_REDACT: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

/// Copy of `headers` safe to log: auth headers and any extra named ones are masked.
pub fn redact_headers(headers: &BTreeMap<String, String>, extra: &[&str]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| {
            let sensitive = ALWAYS_REDACT
                .iter()
                .chain(extra.iter())
                .any(|n| k.eq_ignore_ascii_case(n));
            let v = if sensitive { REDACTED.to_string() } else { v.clone() };
            (k.clone(), v)
        })
        .collect()
}

/// URL with userinfo dropped and the named query parameters masked.
pub fn redact_url(url: &url::Url, secret_query_keys: &[&str]) -> String {
    let mut out = url.clone();
    let _ = out.set_username("");
    let _ = out.set_password(None);
    if !secret_query_keys.is_empty() && out.query().is_some() {
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| {
                let v = if secret_query_keys.iter().any(|s| *s == k) {
                    REDACTED.to_string()
                } else {
                    v.into_owned()
                };
                (k.into_owned(), v)
            })
            .collect();
        out.query_pairs_mut().clear().extend_pairs(pairs);
    }
    out.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_auth_and_named_headers() {
        let mut h = BTreeMap::new();
        h.insert("Authorization".to_string(), "Bearer t".to_string());
        h.insert("X-API-Key".to_string(), "k".to_string());
        h.insert("Accept".to_string(), "application/json".to_string());
        let out = redact_headers(&h, &["x-api-key"]);
        assert_eq!(out["Authorization"], REDACTED);
        assert_eq!(out["X-API-Key"], REDACTED);
        assert_eq!(out["Accept"], "application/json");
    }

    #[test]
    fn masks_query_secrets_and_userinfo() {
        let url = url::Url::parse("https://u:p@x.example.com/a?api_key=s3cret&q=1").unwrap();
        let out = redact_url(&url, &["api_key"]);
        assert!(!out.contains("s3cret"));
        assert!(!out.contains("u:p@"));
        assert!(out.contains("q=1"));
    }
}
