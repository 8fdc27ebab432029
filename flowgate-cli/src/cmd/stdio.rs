use std::sync::Arc;

use flowgate_server::run_line_channel;
use tokio::io::BufReader;

use crate::exit_codes;
use crate::logging::init_tracing;
use crate::settings::{build_dispatcher, load_gateway, log_startup_error};
use crate::{LogArgs, RuntimeArgs, SourceArgs};

pub async fn stdio_cmd(source: SourceArgs, runtime: RuntimeArgs, log: LogArgs) -> i32 {
    init_tracing(&log.log_level);

    let dispatcher = match load_gateway(&source)
        .and_then(|outcome| build_dispatcher(Arc::new(outcome.config), &runtime))
    {
        Ok(d) => d,
        Err(e) => {
            log_startup_error(&e);
            return if e.is_validation() {
                exit_codes::VALIDATION_FAILED
            } else {
                exit_codes::RUNTIME_ERROR
            };
        }
    };

    let input = BufReader::new(tokio::io::stdin());
    match run_line_channel(Arc::new(dispatcher), input, tokio::io::stdout()).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "line channel failed");
            exit_codes::RUNTIME_ERROR
        }
    }
}
