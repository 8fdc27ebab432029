use std::collections::BTreeMap;

use flowgate_core::template::{resolve_string, stringify, Segment, Template};
use flowgate_core::{BindingTable, StepDef};

use crate::credentials::ForwardedCredential;
use crate::error::{RequestSummary, StepExecutionError, StepFailure};
use crate::http::HttpRequestParts;
use crate::sanitize::{redact_headers, redact_url};

pub(crate) struct PreparedRequest {
    pub parts: HttpRequestParts,
    pub summary: RequestSummary,
    pub logged_headers: BTreeMap<String, String>,
}

/// Resolve one step against the table and attach the forwarded credential.
pub(crate) fn prepare(
    step: &StepDef,
    table: &BindingTable,
    credential: Option<&ForwardedCredential>,
) -> Result<PreparedRequest, StepExecutionError> {
    let fail = |url: String, failure: StepFailure| StepExecutionError {
        step_id: step.step_id.clone(),
        request: RequestSummary {
            method: step.method.clone(),
            url,
        },
        failure,
    };
    let template_url = || step.url.as_str().to_string();

    let raw_url = resolve_url(&step.url, table).map_err(|failure| fail(template_url(), failure))?;
    let mut url = url::Url::parse(&raw_url).map_err(|e| {
        fail(
            template_url(),
            StepFailure::InvalidUrl {
                url: template_url(),
                reason: e.to_string(),
            },
        )
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(fail(
            template_url(),
            StepFailure::InvalidUrl {
                url: template_url(),
                reason: format!("scheme '{}' is not http(s)", url.scheme()),
            },
        ));
    }

    let mut headers = BTreeMap::new();
    for (name, tpl) in &step.headers {
        let value = resolve_string(tpl, table).map_err(|e| fail(template_url(), e.into()))?;
        headers.insert(name.clone(), value);
    }

    let body = match &step.body {
        None => Vec::new(),
        Some(tpl) => match tpl.resolve(table).map_err(|e| fail(template_url(), e.into()))? {
            None => Vec::new(),
            Some(v) => {
                if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                    headers.insert("content-type".to_string(), "application/json".to_string());
                }
                v.to_string().into_bytes()
            }
        },
    };

    // Explicit step headers and query keys win over the forwarded credential.
    let mut secret_headers: Vec<&str> = Vec::new();
    let mut secret_query: Vec<&str> = Vec::new();
    match credential {
        Some(ForwardedCredential::Header { name, value }) => {
            secret_headers.push(name);
            if !headers.keys().any(|k| k.eq_ignore_ascii_case(name)) {
                headers.insert(name.clone(), value.expose().to_string());
            }
        }
        Some(ForwardedCredential::Query { name, value }) => {
            secret_query.push(name);
            if !url.query_pairs().any(|(k, _)| k == name.as_str()) {
                url.query_pairs_mut().append_pair(name, value.expose());
            }
        }
        None => {}
    }

    let summary = RequestSummary {
        method: step.method.clone(),
        url: redact_url(&url, &secret_query),
    };
    let logged_headers = redact_headers(&headers, &secret_headers);
    Ok(PreparedRequest {
        parts: HttpRequestParts {
            method: step.method.clone(),
            url,
            headers,
            body,
        },
        summary,
        logged_headers,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlPart {
    Base,
    Path,
    Query,
}

fn url_part(prefix: &str) -> UrlPart {
    if prefix.contains(['?', '#']) {
        return UrlPart::Query;
    }
    match prefix.find("://") {
        Some(i) if prefix[i + 3..].contains('/') => UrlPart::Path,
        _ => UrlPart::Base,
    }
}

/// Substitute placeholders into the URL template. Values landing in the path
/// or query are percent-encoded and may not form a `.`/`..` path segment;
/// values before the first path slash are inserted as written.
fn resolve_url(template: &Template, table: &BindingTable) -> Result<String, StepFailure> {
    let mut out = String::new();
    let mut segments = template.segments().iter().peekable();
    while let Some(segment) = segments.next() {
        let reference = match segment {
            Segment::Literal(text) => {
                out.push_str(text);
                continue;
            }
            Segment::Placeholder(reference) => reference,
        };
        let value = stringify(&table.lookup(reference)?);
        match url_part(&out) {
            UrlPart::Base => out.push_str(&value),
            UrlPart::Query => out.push_str(&urlencoding::encode(&value)),
            UrlPart::Path => {
                let ends_segment = match segments.peek() {
                    None => true,
                    Some(Segment::Literal(next)) => next.starts_with(['/', '?', '#']),
                    Some(Segment::Placeholder(_)) => false,
                };
                if out.ends_with('/') && ends_segment && matches!(value.as_str(), "." | "..") {
                    return Err(StepFailure::InvalidUrl {
                        url: template.as_str().to_string(),
                        reason: format!("'{reference}' resolves to a dot path segment"),
                    });
                }
                out.push_str(&urlencoding::encode(&value));
            }
        }
    }
    Ok(out)
}
