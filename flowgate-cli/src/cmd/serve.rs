use std::sync::Arc;

use flowgate_core::RouteTable;
use flowgate_server::{bind, serve, shutdown_signal, AppState};

use crate::cmd::stdio::stdio_cmd;
use crate::exit_codes;
use crate::logging::init_tracing;
use crate::settings::{build_dispatcher, load_gateway, log_startup_error};
use crate::{ListenArgs, LogArgs, RuntimeArgs, SourceArgs};

pub async fn serve_cmd(source: SourceArgs, runtime: RuntimeArgs, listen: ListenArgs, log: LogArgs) -> i32 {
    if std::env::var("TRANSPORT_MODE").is_ok_and(|m| m.eq_ignore_ascii_case("stdio")) {
        return stdio_cmd(source, runtime, log).await;
    }
    init_tracing(&log.log_level);

    let outcome = match load_gateway(&source) {
        Ok(o) => o,
        Err(e) => {
            log_startup_error(&e);
            return if e.is_validation() {
                exit_codes::VALIDATION_FAILED
            } else {
                exit_codes::RUNTIME_ERROR
            };
        }
    };
    let routes = match RouteTable::build(&outcome.config) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let dispatcher = match build_dispatcher(Arc::new(outcome.config), &runtime) {
        Ok(d) => d,
        Err(e) => {
            log_startup_error(&e);
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let addr = format!("{}:{}", listen.host, listen.port);
    let listener = match bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "refusing to start");
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let state = AppState::new(Arc::new(dispatcher), routes);
    match serve(listener, state, shutdown_signal()).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            exit_codes::RUNTIME_ERROR
        }
    }
}
