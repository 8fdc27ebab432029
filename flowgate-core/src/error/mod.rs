use thiserror::Error;

use crate::route::RouteError;
use crate::template::TemplateError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("document root must be an object")]
    NotAnObject,
}

/// A plan that cannot be compiled. Fatal at configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("x-mcp-source block is malformed: {0}")]
    InvalidSource(String),
    #[error("operation definition is malformed: {0}")]
    InvalidOperation(String),
    #[error("source type '{0}' is not supported (only 'http')")]
    UnsupportedSourceType(String),
    #[error("plan has no steps")]
    EmptyPlan,
    #[error("step id '{0}' is invalid (allowed: A-Z a-z 0-9 _ -)")]
    InvalidStepId(String),
    #[error("step id '{0}' is reserved for parameter namespaces")]
    ReservedStepId(String),
    #[error("step id '{0}' is declared more than once")]
    DuplicateStepId(String),
    #[error("step '{step_id}': method '{method}' is not a standard HTTP method")]
    InvalidMethod { step_id: String, method: String },
    #[error("step '{step_id}': url must not be empty")]
    EmptyUrl { step_id: String },
    #[error("step '{step_id}': url '{url}' must start with http:// or https:// (or a placeholder)")]
    MalformedUrl { step_id: String, url: String },
    #[error("step '{step_id}': header name '{name}' is not a valid token")]
    InvalidHeaderName { step_id: String, name: String },
    #[error("step '{step_id}': malformed template in {field}: {source}")]
    MalformedTemplate {
        step_id: String,
        field: String,
        #[source]
        source: TemplateError,
    },
    #[error("step '{step_id}' references '{referenced}' which is declared at or after it")]
    ForwardReference { step_id: String, referenced: String },
    #[error("step '{step_id}' references unknown step '{referenced}'")]
    UnknownStepReference { step_id: String, referenced: String },
    #[error("step '{step_id}' references undeclared parameter '{namespace}.{name}'")]
    UnknownParameter {
        step_id: String,
        namespace: String,
        name: String,
    },
    #[error("response_step '{0}' does not name a step of this plan")]
    UnknownResponseStep(String),
    #[error("security scheme '{0}' is not defined in components")]
    UnknownSecurityScheme(String),
    #[error("security scheme '{name}' is not supported: {reason}")]
    UnsupportedSecurityScheme { name: String, reason: String },
    #[error("invalid path template: {0}")]
    InvalidPath(#[from] RouteError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation '{operation_id}': {error}")]
pub struct OperationCompileError {
    pub operation_id: String,
    pub error: CompileError,
}

impl OperationCompileError {
    pub fn new(operation_id: impl Into<String>, error: CompileError) -> Self {
        Self {
            operation_id: operation_id.into(),
            error,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("configuration document is invalid: {0}")]
    Document(String),
    #[error("{} operation(s) failed to compile", .0.len())]
    Compile(Vec<OperationCompileError>),
    #[error("no operations with an x-mcp-source extension were found")]
    NoOperations,
    #[error(transparent)]
    Route(#[from] RouteError),
}

impl ConfigError {
    /// Individual compile errors, if this is a compile failure.
    pub fn compile_errors(&self) -> &[OperationCompileError] {
        match self {
            ConfigError::Compile(errs) => errs,
            _ => &[],
        }
    }
}
