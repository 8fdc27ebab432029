use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::template::{Reference, ResolutionError};
use crate::types::ParamLocation;

/// A value bound under one namespace for the duration of a single call.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Json(JsonValue),
    /// A non-JSON body; only addressable as a whole.
    Opaque {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl Binding {
    /// JSON view of the binding; opaque bodies become a (lossy) UTF-8 string.
    pub fn to_value(&self) -> JsonValue {
        match self {
            Binding::Json(v) => v.clone(),
            Binding::Opaque { bytes, .. } => {
                JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

/// Per-call mapping from namespace to bound value.
///
/// Created fresh for every call and dropped with it; never shared.
#[derive(Debug, Default)]
pub struct BindingTable {
    entries: BTreeMap<String, Binding>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the inbound parameter namespaces. Every namespace is bound, even when empty.
    pub fn with_params(params: BTreeMap<ParamLocation, serde_json::Map<String, JsonValue>>) -> Self {
        let mut table = Self::new();
        for loc in ParamLocation::ALL {
            table.bind(loc.namespace(), Binding::Json(JsonValue::Object(Default::default())));
        }
        for (loc, values) in params {
            table.bind(loc.namespace(), Binding::Json(JsonValue::Object(values)));
        }
        table
    }

    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.entries.insert(name.into(), binding);
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, reference: &Reference) -> Result<JsonValue, ResolutionError> {
        let unresolved = || ResolutionError::UnresolvedReference {
            reference: reference.to_string(),
        };
        let binding = self.entries.get(&reference.namespace).ok_or_else(unresolved)?;

        let root = match binding {
            Binding::Json(v) => v,
            Binding::Opaque { .. } => {
                return match reference.path.first() {
                    None => Ok(binding.to_value()),
                    Some(seg) => Err(ResolutionError::TypeMismatch {
                        reference: reference.to_string(),
                        segment: seg.clone(),
                    }),
                };
            }
        };

        let mut cur = root;
        for seg in &reference.path {
            let obj = cur.as_object().ok_or_else(|| ResolutionError::TypeMismatch {
                reference: reference.to_string(),
                segment: seg.clone(),
            })?;
            cur = obj.get(seg).ok_or_else(unresolved)?;
        }
        Ok(cur.clone())
    }
}
