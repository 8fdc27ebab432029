//! JSON-RPC over a newline-delimited channel (stdin/stdout in production).

use std::sync::Arc;

use flowgate_exec::CallHandler;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::credentials::take_auth_headers;
use crate::error::ServerError;
use crate::jsonrpc::parse_request;
use crate::rpc::dispatch;

/// Serve requests from `input` until EOF, one call in flight at a time.
pub async fn run_line_channel<R, W>(
    handler: Arc<dyn CallHandler>,
    input: R,
    mut output: W,
) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    tracing::info!(operations = handler.operation_count(), "line channel ready");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let mut req = match parse_request(line.as_bytes()) {
            Ok(req) => req,
            Err(resp) => {
                write_line(&mut output, &resp.to_json_string()).await?;
                continue;
            }
        };
        let creds = match req.params.as_mut() {
            Some(JsonValue::Object(params)) => take_auth_headers(params),
            _ => Default::default(),
        };

        if let Some(resp) = dispatch(handler.as_ref(), req, creds).await {
            if let Err(e) = write_line(&mut output, &resp.to_json_string()).await {
                tracing::warn!(error = %e, "line channel output closed");
                break;
            }
        }
    }

    tracing::info!("line channel closed");
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<(), ServerError> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
