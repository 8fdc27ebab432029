use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use super::parse::{Template, TemplateError};
use super::reference::Reference;
use super::resolve::{resolve, ResolutionError};
use crate::binding::{Binding, BindingTable};

/// A JSON body whose string leaves are templates.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueTemplate {
    Constant(JsonValue),
    Text(Template),
    Array(Vec<ValueTemplate>),
    Object(BTreeMap<String, ValueTemplate>),
}

impl ValueTemplate {
    pub fn parse(value: &JsonValue) -> Result<Self, TemplateError> {
        match value {
            JsonValue::String(s) => Ok(ValueTemplate::Text(Template::parse(s)?)),
            JsonValue::Array(items) => items
                .iter()
                .map(ValueTemplate::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(ValueTemplate::Array),
            JsonValue::Object(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), ValueTemplate::parse(v)?);
                }
                Ok(ValueTemplate::Object(out))
            }
            other => Ok(ValueTemplate::Constant(other.clone())),
        }
    }

    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            ValueTemplate::Constant(_) => {}
            ValueTemplate::Text(t) => out.extend(t.references()),
            ValueTemplate::Array(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            ValueTemplate::Object(map) => {
                for v in map.values() {
                    v.collect_references(out);
                }
            }
        }
    }

    /// Resolve into a concrete JSON value.
    ///
    /// Members that are a lone `${ns.field}` placeholder for an inbound
    /// parameter the caller left out are dropped. Any other unresolved
    /// reference is an error. `Ok(None)` means the whole body was dropped.
    pub fn resolve(&self, table: &BindingTable) -> Result<Option<JsonValue>, ResolutionError> {
        match self {
            ValueTemplate::Constant(v) => Ok(Some(v.clone())),
            ValueTemplate::Text(t) => match t.single_reference() {
                Some(r) if is_omitted_param(r, table) => Ok(None),
                _ => resolve(t, table).map(Some),
            },
            ValueTemplate::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(v) = item.resolve(table)? {
                        out.push(v);
                    }
                }
                Ok(Some(JsonValue::Array(out)))
            }
            ValueTemplate::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    if let Some(v) = v.resolve(table)? {
                        out.insert(k.clone(), v);
                    }
                }
                Ok(Some(JsonValue::Object(out)))
            }
        }
    }

    /// The authored form, placeholders left in place.
    pub fn to_value(&self) -> JsonValue {
        match self {
            ValueTemplate::Constant(v) => v.clone(),
            ValueTemplate::Text(t) => JsonValue::String(t.as_str().to_string()),
            ValueTemplate::Array(items) => {
                JsonValue::Array(items.iter().map(ValueTemplate::to_value).collect())
            }
            ValueTemplate::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

/// `${ns.field}` where `ns` is a parameter namespace and `field` was not supplied.
fn is_omitted_param(reference: &Reference, table: &BindingTable) -> bool {
    if !reference.is_param() {
        return false;
    }
    match (reference.path.as_slice(), table.get(&reference.namespace)) {
        ([field], Some(Binding::Json(JsonValue::Object(values)))) => !values.contains_key(field),
        _ => false,
    }
}
