use std::path::PathBuf;

use clap::Subcommand;

use crate::args::*;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve REST, JSON-RPC over HTTP and JSON-RPC over SSE on one listener.
    Serve {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        runtime: RuntimeArgs,
        #[command(flatten)]
        listen: ListenArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Serve newline-delimited JSON-RPC on stdin/stdout.
    Stdio {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        runtime: RuntimeArgs,
        #[command(flatten)]
        log: LogArgs,
    },
    /// Compile an OpenAPI document into a configuration blob.
    Compile {
        path: PathBuf,
        #[arg(long = "output", short = 'o')]
        output_file: Option<PathBuf>,
        #[arg(long)]
        skip_invalid: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Compile an OpenAPI document or configuration blob and report errors.
    Validate {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List operations, routes, security and step chains.
    Inspect {
        path: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}
