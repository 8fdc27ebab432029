use serde_json::Value as JsonValue;

use super::parse::{Segment, Template};
use crate::binding::BindingTable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("unresolved reference '{reference}'")]
    UnresolvedReference { reference: String },
    #[error("cannot read '{segment}' from a non-object value while resolving '{reference}'")]
    TypeMismatch { reference: String, segment: String },
}

impl ResolutionError {
    pub fn reference(&self) -> &str {
        match self {
            ResolutionError::UnresolvedReference { reference }
            | ResolutionError::TypeMismatch { reference, .. } => reference,
        }
    }
}

/// Resolve a template against a binding table.
///
/// A template that is exactly one placeholder yields the bound value with its
/// JSON type intact; anything else yields a string.
pub fn resolve(template: &Template, table: &BindingTable) -> Result<JsonValue, ResolutionError> {
    if let Some(r) = template.single_reference() {
        return table.lookup(r);
    }

    let mut out = String::new();
    for seg in template.segments() {
        match seg {
            Segment::Literal(l) => out.push_str(l),
            Segment::Placeholder(r) => out.push_str(&stringify(&table.lookup(r)?)),
        }
    }
    Ok(JsonValue::String(out))
}

pub fn resolve_string(template: &Template, table: &BindingTable) -> Result<String, ResolutionError> {
    match resolve(template, table)? {
        JsonValue::String(s) => Ok(s),
        other => Ok(stringify(&other)),
    }
}

/// Inline rendering of a bound value.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}
