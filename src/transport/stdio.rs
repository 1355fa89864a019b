//! Stdio transport
//!
//! Reads one JSON [`AllowlistRequest`] per line from standard input and writes
//! one JSON line per request to standard output: either an
//! [`AllowlistResponse`](crate::server::AllowlistResponse) or
//! `{"error": "..."}`.

use crate::error::TransportError;
use crate::server::{AllowlistRequest, AllowlistService};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Run the service over stdin/stdout until input ends
pub async fn run_stdio(service: AllowlistService) -> anyhow::Result<()> {
    info!("Starting allowlist service with stdio transport");

    let handled = serve_lines(&service, tokio::io::stdin(), tokio::io::stdout()).await?;

    info!(requests = handled, "Stdio transport stopped");
    Ok(())
}

/// Serve JSON-lines requests from `reader`, returning how many were handled
///
/// A line that is not UTF-8 or not a valid request gets an error line; the
/// loop only stops at end of input or on an I/O error.
pub async fn serve_lines<R, W>(
    service: &AllowlistService,
    reader: R,
    mut writer: W,
) -> Result<usize, TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut handled = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let request_id = AllowlistService::new_request_id();
        let output = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => handle_line(service, &request_id, line.trim())?,
            Err(e) => {
                let err = TransportError::InvalidMessage(format!("line is not valid UTF-8: {}", e));
                warn!(error = %err, "rejecting undecodable request line");
                json!({ "error": err.to_string(), "request_id": request_id })
            }
        };

        let mut encoded = serde_json::to_vec(&output)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        handled += 1;
    }

    Ok(handled)
}

fn handle_line(
    service: &AllowlistService,
    request_id: &str,
    line: &str,
) -> Result<Value, TransportError> {
    let request = match serde_json::from_str::<AllowlistRequest>(line) {
        Ok(request) => request,
        Err(e) => {
            let err = TransportError::InvalidMessage(e.to_string());
            warn!(error = %err, "rejecting malformed request line");
            return Ok(json!({ "error": err.to_string(), "request_id": request_id }));
        }
    };

    match service.check(request_id, request) {
        Ok(response) => Ok(serde_json::to_value(response)?),
        Err(e) => {
            warn!(request_id = %request_id, error = %e, "allowlist check failed");
            Ok(json!({ "error": e.to_string(), "request_id": request_id }))
        }
    }
}
