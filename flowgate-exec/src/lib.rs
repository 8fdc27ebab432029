#![forbid(unsafe_code)]

//! Runtime side of flowgate: binds inbound parameters, forwards credentials
//! and executes compiled plans against downstream HTTP services.

pub mod credentials;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod http;
pub mod limits;
pub mod params;
pub mod sanitize;

pub use crate::credentials::{CredentialError, ForwardedCredential, InboundCredentials, SecretValue};
pub use crate::dispatch::{CallHandler, Dispatcher, InboundCall};
pub use crate::engine::{CallOutput, Engine, EngineConfig};
pub use crate::error::{CallError, RequestSummary, StepExecutionError, StepFailure};
pub use crate::http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use crate::limits::ConcurrencyLimits;
pub use crate::params::{bind_params, ParamError, RawParams};
