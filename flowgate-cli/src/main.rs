use clap::Parser;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod logging;
mod output;
mod settings;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "flowgate",
    version,
    about = "Serve OpenAPI operations backed by x-mcp-source step chains over REST and JSON-RPC"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Serve {
            source,
            runtime,
            listen,
            log,
        } => cmd::serve::serve_cmd(source, runtime, listen, log).await,
        Command::Stdio {
            source,
            runtime,
            log,
        } => cmd::stdio::stdio_cmd(source, runtime, log).await,
        Command::Compile {
            path,
            output_file,
            skip_invalid,
            output,
        } => cmd::compile::compile_cmd(&path, output_file.as_deref(), skip_invalid, output),
        Command::Validate { path, output } => cmd::validate::validate_cmd(&path, output),
        Command::Inspect { path, output } => cmd::inspect::inspect_cmd(&path, output),
    }
}
