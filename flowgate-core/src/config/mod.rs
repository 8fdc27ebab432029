//! Compiled gateway configuration: the immutable set of operations served.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, ConfigError, OperationCompileError};
use crate::openapi::extract_document;
use crate::parser::{parse_document_str, DocumentFormat};
use crate::planner::{compile_plan, ExecutionPlan};
use crate::route::{PathTemplate, RouteTable};
use crate::types::{OperationSpec, ParamLocation, SecurityScheme, SourceDecl};

pub const CONFIG_VERSION: u32 = 1;

/// Serialisable configuration blob, either extracted from OpenAPI or loaded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub version: u32,
    #[serde(default)]
    pub operations: BTreeMap<String, OperationEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationEntry {
    pub operation: OperationSpec,
    pub source: SourceDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOperation {
    pub spec: OperationSpec,
    pub plan: ExecutionPlan,
    pub security: Option<SecurityScheme>,
}

impl CompiledOperation {
    pub fn operation_id(&self) -> &str {
        &self.spec.operation_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompileMode {
    /// Any failing operation fails the whole document.
    #[default]
    Strict,
    /// Failing operations are dropped and reported in `skipped`.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub config: GatewayConfig,
    pub skipped: Vec<OperationCompileError>,
}

/// Every operation the process serves, keyed by operation id.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    operations: BTreeMap<String, Arc<CompiledOperation>>,
}

impl GatewayConfig {
    pub fn get(&self, operation_id: &str) -> Option<&Arc<CompiledOperation>> {
        self.operations.get(operation_id)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Arc<CompiledOperation>> {
        self.operations.values()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Normalised configuration blob for these operations.
    pub fn to_document(&self) -> ConfigDocument {
        let mut doc = ConfigDocument {
            version: CONFIG_VERSION,
            operations: BTreeMap::new(),
            security_schemes: BTreeMap::new(),
        };
        for (id, op) in &self.operations {
            if let (Some(name), Some(scheme)) = (&op.spec.security, &op.security) {
                doc.security_schemes.insert(name.clone(), scheme.clone());
            }
            doc.operations.insert(
                id.clone(),
                OperationEntry {
                    operation: op.spec.clone(),
                    source: op.plan.to_source(),
                },
            );
        }
        doc
    }
}

/// Compile every operation of a configuration document.
pub fn compile_document(doc: &ConfigDocument, mode: CompileMode) -> Result<CompileOutcome, ConfigError> {
    compile_with_errors(doc, Vec::new(), mode)
}

/// Parse and compile an OpenAPI document carrying `x-mcp-source` extensions.
pub fn load_openapi_str(input: &str, mode: CompileMode) -> Result<CompileOutcome, ConfigError> {
    let parsed = parse_document_str(input, DocumentFormat::Auto)?;
    let extraction = extract_document(&parsed.raw);
    compile_with_errors(&extraction.document, extraction.errors, mode)
}

/// Parse and compile a configuration blob previously emitted by `to_document`.
pub fn load_config_str(input: &str, mode: CompileMode) -> Result<CompileOutcome, ConfigError> {
    let parsed = parse_document_str(input, DocumentFormat::Auto)?;
    let doc: ConfigDocument =
        serde_json::from_value(parsed.raw).map_err(|e| ConfigError::Document(e.to_string()))?;
    compile_document(&doc, mode)
}

fn compile_with_errors(
    doc: &ConfigDocument,
    mut errors: Vec<OperationCompileError>,
    mode: CompileMode,
) -> Result<CompileOutcome, ConfigError> {
    if doc.version != CONFIG_VERSION {
        return Err(ConfigError::Document(format!(
            "unsupported configuration version {} (expected {CONFIG_VERSION})",
            doc.version
        )));
    }

    let mut operations = BTreeMap::new();
    for (id, entry) in &doc.operations {
        match compile_operation(id, entry, &doc.security_schemes) {
            Ok(op) => {
                operations.insert(id.clone(), Arc::new(op));
            }
            Err(e) => errors.push(OperationCompileError::new(id.clone(), e)),
        }
    }

    errors.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));
    if mode == CompileMode::Strict && !errors.is_empty() {
        return Err(ConfigError::Compile(errors));
    }
    if operations.is_empty() {
        return Err(if errors.is_empty() {
            ConfigError::NoOperations
        } else {
            ConfigError::Compile(errors)
        });
    }

    let config = GatewayConfig { operations };
    RouteTable::build(&config)?;
    Ok(CompileOutcome {
        config,
        skipped: errors,
    })
}

fn compile_operation(
    id: &str,
    entry: &OperationEntry,
    schemes: &BTreeMap<String, SecurityScheme>,
) -> Result<CompiledOperation, CompileError> {
    let spec = &entry.operation;
    if spec.operation_id != id {
        return Err(CompileError::InvalidOperation(format!(
            "entry key '{id}' does not match operation_id '{}'",
            spec.operation_id
        )));
    }
    let template = PathTemplate::parse(&spec.path)?;
    for name in template.param_names() {
        if spec.param(ParamLocation::Path, name).is_none() {
            return Err(CompileError::InvalidOperation(format!(
                "path parameter '{name}' of '{}' is not declared",
                spec.path
            )));
        }
    }
    let security = match &spec.security {
        None => None,
        Some(name) => Some(
            schemes
                .get(name)
                .cloned()
                .ok_or_else(|| CompileError::UnknownSecurityScheme(name.clone()))?,
        ),
    };
    let plan = compile_plan(spec, &entry.source)?;
    Ok(CompiledOperation {
        spec: spec.clone(),
        plan,
        security,
    })
}
