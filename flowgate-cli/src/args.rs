use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// Where the served operations come from. Flags beat environment variables;
/// among several sources the OpenAPI document wins, then the config file.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// OpenAPI document (JSON or YAML) with x-mcp-source extensions.
    #[arg(long, env = "FLOWGATE_OPENAPI_FILE")]
    pub openapi: Option<PathBuf>,
    /// Compiled configuration blob produced by `flowgate compile`.
    #[arg(long, env = "FLOWGATE_CONFIG_FILE")]
    pub config: Option<PathBuf>,
    /// Inline configuration blob.
    #[arg(long = "config-json", env = "FLOWGATE_CONFIG", hide_env_values = true)]
    pub config_json: Option<String>,
    /// Register valid operations and log the failing ones instead of refusing to start.
    #[arg(long)]
    pub skip_invalid: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RuntimeArgs {
    #[arg(long, default_value_t = 30_000)]
    pub step_timeout_ms: u64,
    /// Overall budget for one call; 0 disables it.
    #[arg(long, default_value_t = 120_000)]
    pub call_deadline_ms: u64,
    #[arg(long, default_value_t = 4_194_304)]
    pub max_response_bytes: usize,
    /// 0 means unbounded.
    #[arg(long, default_value_t = 0)]
    pub max_concurrent_calls: usize,
    #[arg(long = "max-concurrency-host", value_name = "HOST=N")]
    pub max_concurrency_host: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ListenArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

#[derive(Debug, Args, Clone)]
pub struct LogArgs {
    /// Default filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
