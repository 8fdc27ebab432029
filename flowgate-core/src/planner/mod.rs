mod model;
mod scan;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CompileError;
use crate::template::{ReferenceTarget, Template, TemplateError, ValueTemplate};
use crate::types::{OperationSpec, ParamLocation, SourceDecl, StepDecl, HTTP_SOURCE_TYPE};

pub use model::{ExecutionPlan, StepDef};

static STEP_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid regex"));

static TCHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!#$%&'*+\-.^_`|~0-9A-Za-z]+$").expect("valid regex"));

pub const HTTP_METHODS: &[&str] = &[
    "GET", "PUT", "POST", "DELETE", "OPTIONS", "HEAD", "PATCH", "TRACE",
];

/// Validate and linearize the authored steps of one operation.
///
/// Pure and deterministic: the same inputs always produce the same plan, and
/// the first violation in declaration order is reported.
pub fn compile_plan(op: &OperationSpec, source: &SourceDecl) -> Result<ExecutionPlan, CompileError> {
    if !source.source_type.eq_ignore_ascii_case(HTTP_SOURCE_TYPE) {
        return Err(CompileError::UnsupportedSourceType(
            source.source_type.clone(),
        ));
    }
    if source.steps.is_empty() {
        return Err(CompileError::EmptyPlan);
    }

    let positions = declared_positions(&source.steps)?;

    let mut steps = Vec::with_capacity(source.steps.len());
    for (idx, decl) in source.steps.iter().enumerate() {
        let step = compile_step(decl)?;
        check_references(op, &step, idx, &positions)?;
        steps.push(step);
    }

    let response_index = match &source.response_step {
        None => steps.len() - 1,
        Some(id) => *positions
            .get(id.as_str())
            .ok_or_else(|| CompileError::UnknownResponseStep(id.clone()))?,
    };

    Ok(ExecutionPlan {
        steps,
        response_index,
    })
}

fn declared_positions(steps: &[StepDecl]) -> Result<BTreeMap<&str, usize>, CompileError> {
    let reserved: BTreeSet<&str> = ParamLocation::ALL.iter().map(|l| l.namespace()).collect();
    let mut positions = BTreeMap::new();
    for (idx, s) in steps.iter().enumerate() {
        let id = s.step_id.as_str();
        if !STEP_ID_RE.is_match(id) {
            return Err(CompileError::InvalidStepId(id.to_string()));
        }
        if reserved.contains(id) {
            return Err(CompileError::ReservedStepId(id.to_string()));
        }
        if positions.insert(id, idx).is_some() {
            return Err(CompileError::DuplicateStepId(id.to_string()));
        }
    }
    Ok(positions)
}

fn compile_step(decl: &StepDecl) -> Result<StepDef, CompileError> {
    let step_id = decl.step_id.clone();
    let malformed = |field: &str| {
        let step_id = step_id.clone();
        let field = field.to_string();
        move |source: TemplateError| CompileError::MalformedTemplate {
            step_id,
            field,
            source,
        }
    };

    let method = decl.method.trim().to_ascii_uppercase();
    if !HTTP_METHODS.contains(&method.as_str()) {
        return Err(CompileError::InvalidMethod {
            step_id,
            method: decl.method.clone(),
        });
    }

    let raw_url = decl.url.trim();
    if raw_url.is_empty() {
        return Err(CompileError::EmptyUrl { step_id });
    }
    let url = Template::parse(raw_url).map_err(malformed("url"))?;
    if let Some(prefix) = url.literal_prefix() {
        let lower = prefix.to_ascii_lowercase();
        let has_scheme = lower.starts_with("http://") || lower.starts_with("https://");
        // A partial prefix like "http" followed by a placeholder is still fine.
        let scheme_pending = url.segments().len() > 1 && "https://".starts_with(lower.as_str());
        if !has_scheme && !scheme_pending {
            return Err(CompileError::MalformedUrl {
                step_id,
                url: decl.url.clone(),
            });
        }
    }

    let mut headers = BTreeMap::new();
    for (name, value) in &decl.headers {
        if !TCHAR_RE.is_match(name) {
            return Err(CompileError::InvalidHeaderName {
                step_id,
                name: name.clone(),
            });
        }
        let tpl = Template::parse(value).map_err(malformed(&format!("headers.{name}")))?;
        headers.insert(name.clone(), tpl);
    }

    let body = match &decl.body {
        None => None,
        Some(v) => Some(ValueTemplate::parse(v).map_err(malformed("body"))?),
    };

    Ok(StepDef {
        step_id,
        method,
        url,
        headers,
        body,
    })
}

fn check_references(
    op: &OperationSpec,
    step: &StepDef,
    idx: usize,
    positions: &BTreeMap<&str, usize>,
) -> Result<(), CompileError> {
    for r in scan::scan_step(step) {
        match r.target() {
            ReferenceTarget::Param(loc) => {
                // `${body_params}` addresses the whole namespace.
                let Some(name) = r.field() else { continue };
                if op.param(loc, name).is_none() {
                    return Err(CompileError::UnknownParameter {
                        step_id: step.step_id.clone(),
                        namespace: loc.namespace().to_string(),
                        name: name.to_string(),
                    });
                }
            }
            ReferenceTarget::Step(target) => match positions.get(target) {
                Some(&pos) if pos < idx => {}
                Some(_) => {
                    return Err(CompileError::ForwardReference {
                        step_id: step.step_id.clone(),
                        referenced: target.to_string(),
                    })
                }
                None => {
                    return Err(CompileError::UnknownStepReference {
                        step_id: step.step_id.clone(),
                        referenced: target.to_string(),
                    })
                }
            },
        }
    }
    Ok(())
}
