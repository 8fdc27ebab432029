use std::collections::HashSet;

use serde_json::Value as JsonValue;

/// Follow local `#/...` references until a node without `$ref` is reached.
pub(crate) fn deref<'a>(doc: &'a JsonValue, node: &'a JsonValue) -> Result<&'a JsonValue, RefError> {
    let mut seen = HashSet::new();
    let mut current = node;
    while let Some(target) = current.get("$ref").and_then(JsonValue::as_str) {
        current = lookup(doc, target, &mut seen)?;
    }
    Ok(current)
}

fn lookup<'a>(doc: &'a JsonValue, target: &str, seen: &mut HashSet<String>) -> Result<&'a JsonValue, RefError> {
    let pointer = target
        .strip_prefix('#')
        .ok_or_else(|| RefError::ExternalRef(target.to_string()))?;
    if !seen.insert(target.to_string()) {
        return Err(RefError::Cycle(target.to_string()));
    }
    doc.pointer(pointer)
        .ok_or_else(|| RefError::NotFound(target.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefError {
    #[error("external $ref '{0}' is not supported (only '#/...')")]
    ExternalRef(String),
    #[error("$ref '{0}' does not resolve inside the document")]
    NotFound(String),
    #[error("$ref '{0}' is part of a reference cycle")]
    Cycle(String),
}
