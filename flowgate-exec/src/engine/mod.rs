//! Sequential execution of a compiled plan.

mod request;
mod response;

use std::sync::Arc;
use std::time::Duration;

use flowgate_core::{Binding, BindingTable, CompiledOperation};
use tokio::time::Instant;

use crate::credentials::ForwardedCredential;
use crate::error::{CallError, StepExecutionError, StepFailure};
use crate::http::{HttpClient, HttpError};
use crate::limits::ConcurrencyLimits;
use crate::params::BoundParams;

pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub step_timeout: Duration,
    /// Budget for the whole call; `None` disables it.
    pub call_deadline: Option<Duration>,
    pub max_response_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_timeout: DEFAULT_STEP_TIMEOUT,
            call_deadline: Some(DEFAULT_CALL_DEADLINE),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// What a successful call returns: the response step's decoded body.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    Json(serde_json::Value),
    Opaque {
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl CallOutput {
    /// JSON form for transports that can only carry JSON.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            CallOutput::Json(v) => v,
            CallOutput::Opaque { bytes, .. } => {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        }
    }
}

impl From<Binding> for CallOutput {
    fn from(b: Binding) -> Self {
        match b {
            Binding::Json(v) => CallOutput::Json(v),
            Binding::Opaque {
                content_type,
                bytes,
            } => CallOutput::Opaque {
                content_type,
                bytes,
            },
        }
    }
}

/// Shared, stateless executor. Each call gets its own binding table.
#[derive(Clone)]
pub struct Engine {
    http: Arc<dyn HttpClient>,
    limits: ConcurrencyLimits,
    config: EngineConfig,
}

impl Engine {
    pub fn new(http: Arc<dyn HttpClient>, config: EngineConfig) -> Self {
        Self {
            http,
            limits: ConcurrencyLimits::unbounded(),
            config,
        }
    }

    pub fn with_limits(mut self, limits: ConcurrencyLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ConcurrencyLimits {
        &self.limits
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run every step of `op` in order, aborting at the first failure.
    pub async fn execute(
        &self,
        op: &CompiledOperation,
        params: BoundParams,
        credential: Option<&ForwardedCredential>,
    ) -> Result<CallOutput, CallError> {
        let deadline = self.config.call_deadline.map(|d| Instant::now() + d);
        let mut table = BindingTable::with_params(params);
        let steps = op.plan.steps();
        let response_id = op.plan.response_step().step_id.as_str();
        let mut result = None;

        for (completed, step) in steps.iter().enumerate() {
            let exceeded = || CallError::DeadlineExceeded {
                step_id: step.step_id.clone(),
                completed,
            };
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(exceeded());
            }

            let request::PreparedRequest {
                parts,
                summary,
                logged_headers,
            } = request::prepare(step, &table, credential)?;
            tracing::info!(
                operation_id = %op.operation_id(),
                step_id = %step.step_id,
                method = %summary.method,
                url = %summary.url,
                "sending step request"
            );
            tracing::debug!(step_id = %step.step_id, headers = ?logged_headers, "step request headers");

            let host = parts.url.host_str().unwrap_or_default().to_string();
            let send = async {
                let _host_permit = self.limits.acquire_host(&host).await;
                let started = Instant::now();
                let res = tokio::time::timeout(
                    self.config.step_timeout,
                    self.http.send(
                        parts,
                        self.config.step_timeout,
                        self.config.max_response_bytes,
                    ),
                )
                .await
                .unwrap_or(Err(HttpError::Timeout));
                (res, started.elapsed())
            };

            let (res, elapsed) = match deadline {
                Some(d) => tokio::time::timeout_at(d, send).await.map_err(|_| {
                    tracing::warn!(operation_id = %op.operation_id(), step_id = %step.step_id, "call deadline exceeded");
                    exceeded()
                })?,
                None => send.await,
            };

            let step_err = |failure: StepFailure| StepExecutionError {
                step_id: step.step_id.clone(),
                request: summary.clone(),
                failure,
            };
            let resp = match res {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(step_id = %step.step_id, error = %e, "step transport failure");
                    return Err(step_err(e.into()).into());
                }
            };
            tracing::info!(
                step_id = %step.step_id,
                status = resp.status,
                elapsed_ms = elapsed.as_millis() as u64,
                "step response"
            );
            if !resp.is_success() {
                return Err(step_err(StepFailure::Status {
                    status: resp.status,
                    body_excerpt: response::excerpt(&resp.body),
                })
                .into());
            }
            if resp.body.len() > self.config.max_response_bytes {
                return Err(step_err(
                    HttpError::ResponseTooLarge {
                        max_bytes: self.config.max_response_bytes,
                    }
                    .into(),
                )
                .into());
            }

            let binding = response::decode(resp);
            if step.step_id == response_id {
                result = Some(binding.clone());
            }
            table.bind(step.step_id.clone(), binding);
        }

        Ok(result.map(CallOutput::from).unwrap_or(CallOutput::Json(serde_json::Value::Null)))
    }
}
