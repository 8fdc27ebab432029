//! Per-call credential forwarding from the inbound request to every step.

use std::collections::BTreeMap;
use std::sync::Arc;

use flowgate_core::types::ApiKeyLocation;
use flowgate_core::SecurityScheme;
use zeroize::Zeroizing;

/// Credential material: zeroized on drop, never printed.
#[derive(Clone)]
pub struct SecretValue(Arc<Zeroizing<String>>);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::new(Zeroizing::new(value.into())))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

/// Headers and query parameters of the inbound request that may carry credentials.
#[derive(Debug, Clone, Default)]
pub struct InboundCredentials {
    headers: BTreeMap<String, SecretValue>,
    query: BTreeMap<String, SecretValue>,
}

impl InboundCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_string(), SecretValue::new(value));
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .insert(name.to_ascii_lowercase(), SecretValue::new(value));
    }

    pub fn header(&self, name: &str) -> Option<&SecretValue> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    pub fn query(&self, name: &str) -> Option<&SecretValue> {
        self.query.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query.is_empty()
    }
}

/// Where a forwarded credential is attached on each outbound request.
#[derive(Debug, Clone)]
pub enum ForwardedCredential {
    Header { name: String, value: SecretValue },
    Query { name: String, value: SecretValue },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("missing credential: {expected}")]
    MissingCredential { expected: String },
}

/// Extract the credential an operation's scheme requires.
///
/// Fails before any step runs, so a missing credential never reaches a downstream.
pub fn forward(
    scheme: &SecurityScheme,
    inbound: &InboundCredentials,
) -> Result<ForwardedCredential, CredentialError> {
    match scheme {
        SecurityScheme::ApiKey {
            location: ApiKeyLocation::Header,
            name,
        } => inbound
            .header(name)
            .filter(|v| !v.expose().is_empty())
            .map(|value| ForwardedCredential::Header {
                name: name.clone(),
                value: value.clone(),
            })
            .ok_or_else(|| missing(format!("header '{name}'"))),
        SecurityScheme::ApiKey {
            location: ApiKeyLocation::Query,
            name,
        } => inbound
            .query(name)
            .or_else(|| inbound.header(name))
            .filter(|v| !v.expose().is_empty())
            .map(|value| ForwardedCredential::Query {
                name: name.clone(),
                value: value.clone(),
            })
            .ok_or_else(|| missing(format!("query parameter or header '{name}'"))),
        SecurityScheme::Bearer | SecurityScheme::OAuth2 => authorization(inbound, "Bearer"),
        SecurityScheme::Basic => authorization(inbound, "Basic"),
    }
}

fn authorization(
    inbound: &InboundCredentials,
    scheme: &str,
) -> Result<ForwardedCredential, CredentialError> {
    let value = inbound
        .header("authorization")
        .filter(|v| {
            let raw = v.expose();
            raw.split_once(' ').is_some_and(|(s, token)| {
                s.eq_ignore_ascii_case(scheme) && !token.trim().is_empty()
            })
        })
        .ok_or_else(|| missing(format!("Authorization: {scheme} <credentials>")))?;
    Ok(ForwardedCredential::Header {
        name: "Authorization".to_string(),
        value: value.clone(),
    })
}

fn missing(expected: String) -> CredentialError {
    CredentialError::MissingCredential { expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_the_secret() {
        let v = SecretValue::new("hunter2");
        assert!(!format!("{v:?}").contains("hunter2"));
        let creds = InboundCredentials::new().with_header("Authorization", "Bearer hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
