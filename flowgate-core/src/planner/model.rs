use std::collections::BTreeMap;

use crate::template::{Template, ValueTemplate};
use crate::types::{SourceDecl, StepDecl, HTTP_SOURCE_TYPE};

/// One compiled outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDef {
    pub step_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Template,
    pub headers: BTreeMap<String, Template>,
    pub body: Option<ValueTemplate>,
}

/// Ordered, validated step chain for one operation.
///
/// Every step reference points strictly backwards in declaration order, so
/// executing `steps()` front to back always finds its inputs bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub(crate) steps: Vec<StepDef>,
    pub(crate) response_index: usize,
}

impl ExecutionPlan {
    pub fn steps(&self) -> &[StepDef] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step whose decoded body is the call's result.
    pub fn response_step(&self) -> &StepDef {
        &self.steps[self.response_index]
    }

    /// Normalised authored form, used to emit the configuration artifact.
    pub fn to_source(&self) -> SourceDecl {
        let last = self.steps.len().saturating_sub(1);
        SourceDecl {
            source_type: HTTP_SOURCE_TYPE.to_string(),
            steps: self
                .steps
                .iter()
                .map(|s| StepDecl {
                    step_id: s.step_id.clone(),
                    method: s.method.clone(),
                    url: s.url.as_str().to_string(),
                    headers: s
                        .headers
                        .iter()
                        .map(|(k, v)| (k.clone(), v.as_str().to_string()))
                        .collect(),
                    body: s.body.as_ref().map(ValueTemplate::to_value),
                })
                .collect(),
            response_step: (self.response_index != last)
                .then(|| self.response_step().step_id.clone()),
        }
    }
}
