//! One-shot query client used by the local CLI.
//!
//! A query connection never pairs: its first and only message is a
//! `get_request`, and the daemon answers with exactly one object before
//! closing.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::protocol::{ClientMessage, STATUS_ERROR};
use crate::transport::JsonObjectCodec;

/// Default TCP port of the daemon.
pub const DEFAULT_PORT: u16 = 8080;

/// Upper bound on how long a query waits for the daemon's reply.
///
/// Slightly longer than the daemon's own relay timeout so its TIMEOUT
/// reply arrives first.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Loopback address of a daemon listening on `port`.
#[must_use]
pub fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Ask the daemon to fetch live data from a connected device.
///
/// # Errors
///
/// Returns `ClientError::Remote` when the daemon answers with an error status
/// (no device connected, device timed out), or a transport error if the
/// daemon cannot be reached.
pub async fn query(addr: SocketAddr, target: &str, timeout: Duration) -> Result<Value> {
    let stream = TcpStream::connect(addr).await?;
    let mut framed = Framed::new(stream, JsonObjectCodec::new());

    framed
        .send(ClientMessage::GetRequest {
            id: target.to_string(),
            pin: None,
        })
        .await?;
    debug!("Sent get_request for {target} to {addr}");

    let reply = tokio::time::timeout(timeout, framed.next())
        .await
        .map_err(|_| ClientError::Timeout)?
        .ok_or(ClientError::ConnectionClosed)??;

    if reply.get("status").and_then(Value::as_str) == Some(STATUS_ERROR) {
        let message = reply
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(ClientError::Remote(message));
    }

    Ok(reply)
}

/// Check whether something accepts TCP connections at `addr`.
pub async fn is_listening(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}
