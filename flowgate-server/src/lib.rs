#![forbid(unsafe_code)]

//! Transport adapters. Every front end builds an [`InboundCall`](flowgate_exec::InboundCall)
//! and hands it to the same [`CallHandler`](flowgate_exec::CallHandler).

pub mod app;
pub mod credentials;
pub mod error;
pub mod jsonrpc;
pub mod line;
pub mod rest;
pub mod rpc;
pub mod session;
pub mod sse;

pub use crate::app::{bind, build_router, serve, shutdown_signal, AppState};
pub use crate::error::ServerError;
pub use crate::line::run_line_channel;
pub use crate::session::{ChannelState, SessionRegistry};
