//! `${namespace.field.sub}` templates.
//!
//! Templates are parsed once when a plan is compiled and resolved per call
//! against that call's [`BindingTable`](crate::binding::BindingTable).

mod parse;
mod reference;
mod resolve;
mod value;

pub use parse::{parse_template, Segment, Template, TemplateError};
pub use reference::{Reference, ReferenceTarget};
pub use resolve::{resolve, resolve_string, stringify, ResolutionError};
pub use value::ValueTemplate;
