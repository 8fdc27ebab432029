use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const HTTP_SOURCE_TYPE: &str = "http";

/// The `x-mcp-source` extension block as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDecl {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default)]
    pub steps: Vec<StepDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_step: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDecl {
    pub step_id: String,
    pub method: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}
