#![forbid(unsafe_code)]

pub mod binding;
pub mod config;
pub mod error;
pub mod openapi;
pub mod parser;
pub mod planner;
pub mod route;
pub mod template;
pub mod types;

pub use crate::binding::{Binding, BindingTable};
pub use crate::config::{
    compile_document, load_config_str, load_openapi_str, CompileMode, CompileOutcome,
    CompiledOperation, ConfigDocument, GatewayConfig, OperationEntry,
};
pub use crate::error::{CompileError, ConfigError, OperationCompileError, ParseError};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::planner::{compile_plan, ExecutionPlan, StepDef};
pub use crate::route::{PathTemplate, RouteError, RouteMatch, RouteTable};
pub use crate::template::{ResolutionError, Template, ValueTemplate};
pub use crate::types::{OperationSpec, ParamLocation, ParamSpec, ParamType, SecurityScheme, SourceDecl, StepDecl};
