mod operation;
mod security;
mod source;

pub use operation::{OperationSpec, ParamLocation, ParamSpec, ParamType};
pub use security::{ApiKeyLocation, SecurityScheme};
pub use source::{SourceDecl, StepDecl, HTTP_SOURCE_TYPE};
