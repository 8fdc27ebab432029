//! Extraction of `x-mcp-source` operations from an OpenAPI 3.x document.

mod extract;
mod refs;

pub use extract::{extract_document, Extraction, SOURCE_EXTENSION};
pub use refs::RefError;
