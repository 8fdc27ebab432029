use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub raw: serde_json::Value,
    pub format: DocumentFormat,
}

/// Parse an OpenAPI or configuration document into a JSON tree.
///
/// YAML input is converted to the same `serde_json::Value` representation so
/// downstream code only deals with one shape. The root must be an object.
pub fn parse_document_str(input: &str, format: DocumentFormat) -> Result<ParsedDocument, ParseError> {
    let parsed = match format {
        DocumentFormat::Json => ParsedDocument {
            raw: serde_json::from_str(input)?,
            format,
        },
        DocumentFormat::Yaml => ParsedDocument {
            raw: serde_yaml::from_str(input)?,
            format,
        },
        DocumentFormat::Auto => parse_document_auto(input)?,
    };
    if !parsed.raw.is_object() {
        return Err(ParseError::NotAnObject);
    }
    Ok(parsed)
}

fn parse_document_auto(input: &str) -> Result<ParsedDocument, ParseError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str(input) {
            Ok(raw) => Ok(ParsedDocument {
                raw,
                format: DocumentFormat::Json,
            }),
            // Flow-style YAML also starts with `{`.
            Err(e) => serde_yaml::from_str(input)
                .map(|raw| ParsedDocument {
                    raw,
                    format: DocumentFormat::Yaml,
                })
                .map_err(|_| ParseError::Json(e)),
        };
    }

    serde_yaml::from_str(input)
        .map(|raw| ParsedDocument {
            raw,
            format: DocumentFormat::Yaml,
        })
        .map_err(ParseError::Yaml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_json_and_yaml() {
        let j = parse_document_str(r#"{"openapi":"3.0.0"}"#, DocumentFormat::Auto).unwrap();
        assert_eq!(j.format, DocumentFormat::Json);
        let y = parse_document_str("openapi: 3.0.0\npaths: {}\n", DocumentFormat::Auto).unwrap();
        assert_eq!(y.format, DocumentFormat::Yaml);
        assert_eq!(y.raw["openapi"], "3.0.0");
    }

    #[test]
    fn rejects_non_object_root() {
        let err = parse_document_str("[1, 2]", DocumentFormat::Auto).unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject));
    }
}
