use flowgate_core::ResolutionError;

use crate::credentials::CredentialError;
use crate::http::HttpError;
use crate::params::ParamError;

/// Method and redacted URL of a step request, safe to log and return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
}

impl std::fmt::Display for RequestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepFailure {
    #[error("downstream returned status {status}")]
    Status { status: u16, body_excerpt: String },
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error("resolved url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A step that did not produce a usable response. Aborts the plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("step '{step_id}' ({request}) failed: {failure}")]
pub struct StepExecutionError {
    pub step_id: String,
    pub request: RequestSummary,
    pub failure: StepFailure,
}

impl StepExecutionError {
    pub fn status(&self) -> Option<u16> {
        match &self.failure {
            StepFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Every way a single call can fail, as reported to a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("invalid params: {0}")]
    InvalidParams(#[from] ParamError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Step(#[from] StepExecutionError),
    #[error("call deadline exceeded during step '{step_id}' after {completed} completed step(s)")]
    DeadlineExceeded { step_id: String, completed: usize },
    #[error("too many concurrent calls")]
    Overloaded,
}

impl CallError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            CallError::UnknownOperation(_) => "unknown_operation",
            CallError::InvalidParams(_) => "invalid_params",
            CallError::Credential(_) => "missing_credential",
            CallError::Step(e) => match e.failure {
                StepFailure::Resolution(_) => "resolution_error",
                _ => "step_execution_error",
            },
            CallError::DeadlineExceeded { .. } => "deadline_exceeded",
            CallError::Overloaded => "overloaded",
        }
    }

    pub fn step_id(&self) -> Option<&str> {
        match self {
            CallError::Step(e) => Some(&e.step_id),
            CallError::DeadlineExceeded { step_id, .. } => Some(step_id),
            _ => None,
        }
    }

    pub fn downstream_status(&self) -> Option<u16> {
        match self {
            CallError::Step(e) => e.status(),
            _ => None,
        }
    }
}
