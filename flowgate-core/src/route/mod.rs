//! Inbound REST routing: OpenAPI path templates matched against request paths.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("path '{0}' must start with '/'")]
    NotAbsolute(String),
    #[error("path '{path}' has a malformed segment '{segment}'")]
    MalformedSegment { path: String, segment: String },
    #[error("path '{path}' repeats parameter '{name}'")]
    DuplicateParam { path: String, name: String },
    #[error("{method} {path} is served by both '{first}' and '{second}'")]
    Conflict {
        method: String,
        path: String,
        first: String,
        second: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

/// A parsed OpenAPI path such as `/orders/{order_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteError::NotAbsolute(path.to_string()));
        }
        let mut segments = Vec::new();
        let mut seen = Vec::<&str>::new();
        for seg in split_path(path) {
            let malformed = || RouteError::MalformedSegment {
                path: path.to_string(),
                segment: seg.to_string(),
            };
            if let Some(inner) = seg.strip_prefix('{') {
                let name = inner.strip_suffix('}').ok_or_else(malformed)?;
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(malformed());
                }
                if seen.contains(&name) {
                    return Err(RouteError::DuplicateParam {
                        path: path.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
                segments.push(PathSegment::Param(name.to_string()));
            } else if seg.contains(['{', '}']) {
                // Mixed segments like `file.{ext}` are not routable.
                return Err(malformed());
            } else {
                segments.push(PathSegment::Literal(seg.to_string()));
            }
        }
        Ok(Self {
            raw: path.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Param(n) => Some(n.as_str()),
            PathSegment::Literal(_) => None,
        })
    }

    /// Match a request path, returning raw (still percent-encoded) captures.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let parts: Vec<&str> = split_path(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut captures = BTreeMap::new();
        for (seg, part) in self.segments.iter().zip(parts) {
            match seg {
                PathSegment::Literal(l) if l == part => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param(_) if part.is_empty() => return None,
                PathSegment::Param(name) => {
                    captures.insert(name.clone(), part.to_string());
                }
            }
        }
        Some(captures)
    }

    /// Literal segments count as more specific than parameters, position by position.
    fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|s| matches!(s, PathSegment::Literal(_)))
            .collect()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.trim_start_matches('/');
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed.split('/').filter(move |_| !trimmed.is_empty())
}

#[derive(Debug, Clone)]
struct Route {
    method: String,
    template: PathTemplate,
    operation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Found {
        operation_id: String,
        params: BTreeMap<String, String>,
    },
    MethodNotAllowed {
        allowed: Vec<String>,
    },
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn build(config: &GatewayConfig) -> Result<Self, RouteError> {
        let mut routes: Vec<Route> = Vec::new();
        for op in config.operations() {
            let spec = &op.spec;
            let template = PathTemplate::parse(&spec.path)?;
            let method = spec.method.to_ascii_uppercase();
            if let Some(existing) = routes
                .iter()
                .find(|r| r.method == method && r.template.segments == template.segments)
            {
                return Err(RouteError::Conflict {
                    method,
                    path: spec.path.clone(),
                    first: existing.operation_id.clone(),
                    second: spec.operation_id.clone(),
                });
            }
            routes.push(Route {
                method,
                template,
                operation_id: spec.operation_id.clone(),
            });
        }
        // Most specific first so that `/orders/latest` wins over `/orders/{id}`.
        routes.sort_by(|a, b| {
            b.template
                .specificity()
                .cmp(&a.template.specificity())
                .then_with(|| a.template.raw.cmp(&b.template.raw))
        });
        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn lookup(&self, method: &str, path: &str) -> RouteMatch {
        let method = method.to_ascii_uppercase();
        let mut allowed = Vec::new();
        for route in &self.routes {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            if route.method == method {
                return RouteMatch::Found {
                    operation_id: route.operation_id.clone(),
                    params,
                };
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }
        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            allowed.sort();
            RouteMatch::MethodNotAllowed { allowed }
        }
    }
}
