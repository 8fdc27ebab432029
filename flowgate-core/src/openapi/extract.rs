use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::config::{ConfigDocument, OperationEntry, CONFIG_VERSION};
use crate::error::{CompileError, OperationCompileError};
use crate::types::{OperationSpec, ParamLocation, ParamSpec, ParamType, SecurityScheme, SourceDecl};

use super::refs::{deref, RefError};

pub const SOURCE_EXTENSION: &str = "x-mcp-source";

const METHOD_KEYS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Operations pulled from an OpenAPI document, plus those that could not be read.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub document: ConfigDocument,
    pub errors: Vec<OperationCompileError>,
}

/// Walk `paths` and collect every operation that has both an `operationId`
/// and an `x-mcp-source` block. Operations without either are ignored.
pub fn extract_document(raw: &JsonValue) -> Extraction {
    let mut document = ConfigDocument {
        version: CONFIG_VERSION,
        operations: BTreeMap::new(),
        security_schemes: BTreeMap::new(),
    };
    let mut errors = Vec::new();

    let mut unsupported = BTreeMap::<String, String>::new();
    if let Some(schemes) = raw
        .pointer("/components/securitySchemes")
        .and_then(|v| v.as_object())
    {
        for (name, scheme) in schemes {
            let converted = deref(raw, scheme)
                .map_err(|e| e.to_string())
                .and_then(SecurityScheme::from_openapi);
            match converted {
                Ok(s) => {
                    document.security_schemes.insert(name.clone(), s);
                }
                Err(reason) => {
                    unsupported.insert(name.clone(), reason);
                }
            }
        }
    }

    let default_security = first_security_name(raw.get("security"));

    let Some(paths) = raw.get("paths").and_then(|v| v.as_object()) else {
        return Extraction { document, errors };
    };

    for (path, path_item) in paths {
        let path_item = match deref(raw, path_item) {
            Ok(v) => v,
            Err(_) => continue,
        };
        for method in METHOD_KEYS {
            let Some(op) = path_item.get(*method) else {
                continue;
            };
            let (Some(operation_id), Some(source)) = (
                op.get("operationId").and_then(|v| v.as_str()),
                op.get(SOURCE_EXTENSION),
            ) else {
                continue;
            };

            let result = extract_operation(
                raw,
                path,
                method,
                operation_id,
                path_item,
                op,
                source,
                default_security.as_ref(),
                &unsupported,
            )
            .and_then(|entry| {
                if document.operations.contains_key(operation_id) {
                    Err(CompileError::InvalidOperation(format!(
                        "operationId '{operation_id}' is declared more than once"
                    )))
                } else {
                    Ok(entry)
                }
            });
            match result {
                Ok(entry) => {
                    document.operations.insert(operation_id.to_string(), entry);
                }
                Err(e) => errors.push(OperationCompileError::new(operation_id, e)),
            }
        }
    }

    Extraction { document, errors }
}

#[allow(clippy::too_many_arguments)]
fn extract_operation(
    raw: &JsonValue,
    path: &str,
    method: &str,
    operation_id: &str,
    path_item: &JsonValue,
    op: &JsonValue,
    source: &JsonValue,
    default_security: Option<&Option<String>>,
    unsupported: &BTreeMap<String, String>,
) -> Result<OperationEntry, CompileError> {
    let source: SourceDecl = serde_json::from_value(source.clone())
        .map_err(|e| CompileError::InvalidSource(e.to_string()))?;

    let mut merged = BTreeMap::<(ParamLocation, String), ParamSpec>::new();
    for list in [path_item.get("parameters"), op.get("parameters")]
        .into_iter()
        .flatten()
    {
        for p in extract_parameters(raw, list).map_err(ref_error)? {
            // Operation level comes second and overrides the path item.
            merged.insert((p.location, p.name.clone()), p);
        }
    }

    let mut body_required = false;
    if let Some(rb) = op.get("requestBody") {
        let rb = deref(raw, rb).map_err(ref_error)?;
        body_required = rb.get("required").and_then(|v| v.as_bool()).unwrap_or(false);
        for p in extract_body_params(raw, rb).map_err(ref_error)? {
            merged.insert((p.location, p.name.clone()), p);
        }
    }

    let security = match op.get("security") {
        Some(s) => first_security_name(Some(s)).flatten(),
        None => default_security.cloned().flatten(),
    };
    if let Some(name) = &security {
        if let Some(reason) = unsupported.get(name) {
            return Err(CompileError::UnsupportedSecurityScheme {
                name: name.clone(),
                reason: reason.clone(),
            });
        }
    }

    Ok(OperationEntry {
        operation: OperationSpec {
            operation_id: operation_id.to_string(),
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            parameters: merged.into_values().collect(),
            body_required,
            security,
        },
        source,
    })
}

fn ref_error(e: RefError) -> CompileError {
    CompileError::InvalidOperation(e.to_string())
}

/// `None` when the key is absent, `Some(None)` for an explicit empty requirement.
fn first_security_name(security: Option<&JsonValue>) -> Option<Option<String>> {
    let reqs = security?.as_array()?;
    Some(
        reqs.iter()
            .filter_map(|r| r.as_object())
            .find_map(|r| r.keys().next().cloned()),
    )
}

fn extract_parameters(raw: &JsonValue, list: &JsonValue) -> Result<Vec<ParamSpec>, RefError> {
    let Some(items) = list.as_array() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for item in items {
        let p = deref(raw, item)?;
        let Some(name) = p.get("name").and_then(|v| v.as_str()) else {
            continue;
        };
        let location = match p.get("in").and_then(|v| v.as_str()) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            // cookie parameters are not forwarded
            _ => continue,
        };
        let required = location == ParamLocation::Path
            || p.get("required").and_then(|v| v.as_bool()).unwrap_or(false);
        out.push(ParamSpec {
            name: name.to_string(),
            location,
            required,
            param_type: schema_type(raw, p.get("schema"))?,
        });
    }
    Ok(out)
}

fn extract_body_params(raw: &JsonValue, request_body: &JsonValue) -> Result<Vec<ParamSpec>, RefError> {
    let Some(schema) = request_body.pointer("/content/application~1json/schema") else {
        return Ok(Vec::new());
    };
    let schema = deref(raw, schema)?;
    let required: Vec<&str> = schema
        .get("required")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    let Some(props) = schema.get("properties").and_then(|v| v.as_object()) else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(props.len());
    for (name, prop) in props {
        out.push(ParamSpec {
            name: name.clone(),
            location: ParamLocation::Body,
            required: required.contains(&name.as_str()),
            param_type: schema_type(raw, Some(prop))?,
        });
    }
    Ok(out)
}

fn schema_type(raw: &JsonValue, schema: Option<&JsonValue>) -> Result<ParamType, RefError> {
    let Some(schema) = schema else {
        return Ok(ParamType::default());
    };
    let schema = deref(raw, schema)?;
    Ok(schema
        .get("type")
        .and_then(|v| v.as_str())
        .and_then(ParamType::from_schema_type)
        .unwrap_or_default())
}
