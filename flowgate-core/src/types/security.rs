use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
}

/// Normalised form of an OpenAPI `components.securitySchemes` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecurityScheme {
    ApiKey {
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        name: String,
    },
    Bearer,
    Basic,
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl SecurityScheme {
    /// Convert a raw OpenAPI Security Scheme Object.
    pub fn from_openapi(raw: &serde_json::Value) -> Result<Self, String> {
        let ty = raw
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "security scheme is missing 'type'".to_string())?;
        match ty {
            "apiKey" => {
                let name = raw
                    .get("name")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| "apiKey scheme is missing 'name'".to_string())?;
                let location = match raw.get("in").and_then(|v| v.as_str()) {
                    Some("header") => ApiKeyLocation::Header,
                    Some("query") => ApiKeyLocation::Query,
                    Some(other) => return Err(format!("apiKey in '{other}' is not supported")),
                    None => return Err("apiKey scheme is missing 'in'".to_string()),
                };
                Ok(SecurityScheme::ApiKey {
                    location,
                    name: name.to_string(),
                })
            }
            "http" => {
                let scheme = raw
                    .get("scheme")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                match scheme.as_str() {
                    "bearer" => Ok(SecurityScheme::Bearer),
                    "basic" => Ok(SecurityScheme::Basic),
                    other => Err(format!("http scheme '{other}' is not supported")),
                }
            }
            "oauth2" => Ok(SecurityScheme::OAuth2),
            other => Err(format!("security scheme type '{other}' is not supported")),
        }
    }
}
