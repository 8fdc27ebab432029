//! Turns command line arguments into a compiled gateway and a dispatcher.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use flowgate_core::{
    load_config_str, load_openapi_str, parse_document_str, CompileMode, CompileOutcome, ConfigError,
    DocumentFormat, GatewayConfig, OperationCompileError,
};
use flowgate_exec::{ConcurrencyLimits, Dispatcher, Engine, EngineConfig, HttpError, ReqwestHttpClient};
use thiserror::Error;

use crate::{RuntimeArgs, SourceArgs};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("no configuration source: pass --openapi, --config or set FLOWGATE_OPENAPI_FILE, FLOWGATE_CONFIG_FILE or FLOWGATE_CONFIG")]
    NoSource,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid --max-concurrency-host value '{0}' (expected HOST=N)")]
    InvalidHostLimit(String),
    #[error("failed to build outbound HTTP client: {0}")]
    Http(#[from] HttpError),
}

impl SettingsError {
    /// Whether the failure comes from the document itself rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(self, SettingsError::Config(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    OpenApiFile(PathBuf),
    ConfigFile(PathBuf),
    Inline(String),
}

impl ConfigSource {
    pub fn from_args(args: &SourceArgs) -> Option<Self> {
        if let Some(path) = &args.openapi {
            return Some(ConfigSource::OpenApiFile(path.clone()));
        }
        if let Some(path) = &args.config {
            return Some(ConfigSource::ConfigFile(path.clone()));
        }
        args.config_json
            .as_ref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| ConfigSource::Inline(s.clone()))
    }
}

pub fn compile_mode(skip_invalid: bool) -> CompileMode {
    if skip_invalid {
        CompileMode::Lenient
    } else {
        CompileMode::Strict
    }
}

pub fn read_file(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile the gateway named by the source flags.
pub fn load_gateway(args: &SourceArgs) -> Result<CompileOutcome, SettingsError> {
    let mode = compile_mode(args.skip_invalid);
    let outcome = match ConfigSource::from_args(args).ok_or(SettingsError::NoSource)? {
        ConfigSource::OpenApiFile(path) => load_openapi_str(&read_file(&path)?, mode)?,
        ConfigSource::ConfigFile(path) => load_config_str(&read_file(&path)?, mode)?,
        ConfigSource::Inline(blob) => load_config_str(&blob, mode)?,
    };
    log_skipped(&outcome.skipped);
    Ok(outcome)
}

/// Compile a file that is either an OpenAPI document or a configuration blob.
pub fn load_path(path: &Path, mode: CompileMode) -> Result<CompileOutcome, SettingsError> {
    let content = read_file(path)?;
    let parsed = parse_document_str(&content, DocumentFormat::Auto).map_err(ConfigError::from)?;
    if parsed.raw.get("openapi").is_some() {
        Ok(load_openapi_str(&content, mode)?)
    } else {
        Ok(load_config_str(&content, mode)?)
    }
}

fn log_skipped(skipped: &[OperationCompileError]) {
    for err in skipped {
        tracing::warn!(operation_id = %err.operation_id, error = %err.error, "operation skipped");
    }
}

/// Log a startup failure, one line per failing operation.
pub fn log_startup_error(err: &SettingsError) {
    if let SettingsError::Config(config_err) = err {
        for op_err in config_err.compile_errors() {
            tracing::error!(operation_id = %op_err.operation_id, error = %op_err.error, "operation failed to compile");
        }
    }
    tracing::error!(error = %err, "refusing to start");
}

pub fn engine_config(args: &RuntimeArgs) -> EngineConfig {
    EngineConfig {
        step_timeout: Duration::from_millis(args.step_timeout_ms),
        call_deadline: (args.call_deadline_ms > 0).then(|| Duration::from_millis(args.call_deadline_ms)),
        max_response_bytes: args.max_response_bytes,
    }
}

pub fn host_limits(values: &[String]) -> Result<BTreeMap<String, usize>, SettingsError> {
    let mut limits = BTreeMap::new();
    for raw in values {
        let (host, n) = raw
            .split_once('=')
            .ok_or_else(|| SettingsError::InvalidHostLimit(raw.clone()))?;
        let n: usize = n
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidHostLimit(raw.clone()))?;
        let host = host.trim();
        if host.is_empty() {
            return Err(SettingsError::InvalidHostLimit(raw.clone()));
        }
        limits.insert(host.to_ascii_lowercase(), n);
    }
    Ok(limits)
}

pub fn build_dispatcher(config: Arc<GatewayConfig>, args: &RuntimeArgs) -> Result<Dispatcher, SettingsError> {
    let limits = ConcurrencyLimits::new(args.max_concurrent_calls, &host_limits(&args.max_concurrency_host)?);
    let http = ReqwestHttpClient::try_new()?;
    let engine = Engine::new(Arc::new(http), engine_config(args)).with_limits(limits);
    Ok(Dispatcher::new(config, engine))
}
