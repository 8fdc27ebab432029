use std::sync::Arc;

use async_trait::async_trait;
use flowgate_core::GatewayConfig;

use crate::credentials::{forward, InboundCredentials};
use crate::engine::{CallOutput, Engine};
use crate::error::CallError;
use crate::params::{bind_params, RawParams};

/// One inbound invocation, independent of the transport it arrived on.
#[derive(Debug, Clone, Default)]
pub struct InboundCall {
    pub operation_id: String,
    pub params: RawParams,
    pub credentials: InboundCredentials,
}

impl InboundCall {
    pub fn new(operation_id: impl Into<String>, params: RawParams) -> Self {
        Self {
            operation_id: operation_id.into(),
            params,
            credentials: InboundCredentials::new(),
        }
    }

    pub fn with_credentials(mut self, credentials: InboundCredentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// The seam every transport adapter calls through.
#[async_trait]
pub trait CallHandler: Send + Sync {
    async fn call(&self, call: InboundCall) -> Result<CallOutput, CallError>;

    fn operation_count(&self) -> usize;
}

/// Looks up the compiled operation, checks credentials and params, then runs the plan.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<GatewayConfig>,
    engine: Engine,
}

impl Dispatcher {
    pub fn new(config: Arc<GatewayConfig>, engine: Engine) -> Self {
        Self { config, engine }
    }

    pub fn config(&self) -> &Arc<GatewayConfig> {
        &self.config
    }
}

#[async_trait]
impl CallHandler for Dispatcher {
    async fn call(&self, call: InboundCall) -> Result<CallOutput, CallError> {
        let op = self
            .config
            .get(&call.operation_id)
            .ok_or_else(|| CallError::UnknownOperation(call.operation_id.clone()))?;

        let _permit = self.engine.limits().try_admit_call().ok_or_else(|| {
            tracing::warn!(operation_id = %call.operation_id, "call rejected: concurrency limit reached");
            CallError::Overloaded
        })?;

        let credential = match &op.security {
            None => None,
            Some(scheme) => Some(forward(scheme, &call.credentials).inspect_err(|e| {
                tracing::warn!(operation_id = %call.operation_id, error = %e, "call rejected");
            })?),
        };
        let params = bind_params(&op.spec, &call.params).inspect_err(|e| {
            tracing::warn!(operation_id = %call.operation_id, error = %e, "call rejected");
        })?;

        tracing::info!(operation_id = %call.operation_id, steps = op.plan.len(), "call started");
        let result = self.engine.execute(op, params, credential.as_ref()).await;
        match &result {
            Ok(_) => tracing::info!(operation_id = %call.operation_id, "call completed"),
            Err(e) => {
                tracing::warn!(operation_id = %call.operation_id, code = e.code(), error = %e, "call failed")
            }
        }
        result
    }

    fn operation_count(&self) -> usize {
        self.config.len()
    }
}
