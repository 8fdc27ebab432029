use std::future::Future;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use flowgate_core::RouteTable;
use flowgate_exec::CallHandler;
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::session::SessionRegistry;
use crate::{rest, rpc, sse};

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn CallHandler>,
    pub routes: Arc<RouteTable>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(handler: Arc<dyn CallHandler>, routes: RouteTable) -> Self {
        Self {
            handler,
            routes: Arc::new(routes),
            sessions: SessionRegistry::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/rpc", post(rpc::rpc_handler))
        .route("/sse", get(sse::connect))
        .route("/messages", post(sse::post_message))
        .route("/events", get(sse::one_shot))
        .fallback(rest::rest_handler)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<JsonValue> {
    Json(json!({"status": "ok", "operations": state.handler.operation_count()}))
}

pub async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Serve every HTTP transport on one listener until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, operations = state.handler.operation_count(), "flowgate listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
