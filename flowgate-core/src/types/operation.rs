use serde::{Deserialize, Serialize};

/// Where an inbound call parameter is read from.
///
/// Each location is also the template namespace the parameter is bound under
/// (`path_params`, `query_params`, `header_params`, `body_params`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParamLocation {
    pub const ALL: [ParamLocation; 4] = [
        ParamLocation::Path,
        ParamLocation::Query,
        ParamLocation::Header,
        ParamLocation::Body,
    ];

    pub fn namespace(self) -> &'static str {
        match self {
            ParamLocation::Path => "path_params",
            ParamLocation::Query => "query_params",
            ParamLocation::Header => "header_params",
            ParamLocation::Body => "body_params",
        }
    }

    pub fn from_namespace(ns: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|loc| loc.namespace() == ns)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Body => "body",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub(crate) fn from_schema_type(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ParamType::String),
            "integer" => Some(ParamType::Integer),
            "number" => Some(ParamType::Number),
            "boolean" => Some(ParamType::Boolean),
            "object" => Some(ParamType::Object),
            "array" => Some(ParamType::Array),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub param_type: ParamType,
}

/// One OpenAPI path+method entry that carries an `x-mcp-source` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub operation_id: String,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
    #[serde(default)]
    pub body_required: bool,
    /// Name of the security scheme in `security_schemes`; `None` means no credential forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
}

impl OperationSpec {
    pub fn param(&self, location: ParamLocation, name: &str) -> Option<&ParamSpec> {
        self.parameters
            .iter()
            .find(|p| p.location == location && p.name == name)
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParamSpec> {
        self.parameters.iter().filter(move |p| p.location == location)
    }
}
