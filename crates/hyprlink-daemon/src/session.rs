//! Per-connection state machine.
//!
//! A connection first sends one object. A `get_request` is answered through
//! the relay and closed. Anything else is a pairing request: known
//! credentials authorize directly, otherwise the operator is shown a PIN and
//! the device has one attempt to echo it back. Authorized sessions join the
//! registry and dispatch messages until the stream ends.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use hyprlink_core::mint_device;
use hyprlink_rpc::{
    ClientMessage, GET_REQUEST, INVALID_PIN, JsonObjectCodec, Outbound, PairingRequest,
    PinSubmission, Response, SYS_INFO, message_type,
};
use hyprlink_types::TrustedDevice;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::executor;
use crate::registry::ConnectionId;
use crate::state::DaemonState;

const NOTIFY_APP: &str = "HyprLink";
const NOTIFY_TITLE: &str = "Pairing request";

type Connection = Framed<TcpStream, JsonObjectCodec>;

/// How a session got past the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Presented credentials found in the trust store
    Trusted,
    /// Paired just now; the minted credentials go out with the sync reply
    Paired(TrustedDevice),
}

/// Read one object, giving up after `deadline`.
async fn read_frame(framed: &mut Connection, deadline: Duration) -> Option<Value> {
    match tokio::time::timeout(deadline, framed.next()).await {
        Ok(Some(Ok(value))) => Some(value),
        Ok(Some(Err(e))) => {
            debug!("Decode failed: {e}");
            None
        }
        Ok(None) => None,
        Err(_) => {
            debug!("No message within {deadline:?}");
            None
        }
    }
}

pub async fn handle_connection(stream: TcpStream, state: Arc<DaemonState>) -> Result<()> {
    let peer = stream.peer_addr().ok();
    let mut framed = Framed::new(stream, JsonObjectCodec::new());

    let Some(first) = read_frame(&mut framed, state.timings.first_read).await else {
        debug!("Closing {peer:?} before handshake");
        return Ok(());
    };

    if message_type(&first) == Some(GET_REQUEST) {
        debug!("Relay request from {peer:?}");
        let reply = state.relay.call(&state.registry, first).await;
        framed.send(reply).await?;
        return Ok(());
    }

    let request: PairingRequest = match serde_json::from_value(first) {
        Ok(request) => request,
        Err(e) => {
            debug!("Malformed pairing request from {peer:?}: {e}");
            return Ok(());
        }
    };

    let Some(authorization) = authorize(&mut framed, &request, &state).await? else {
        return Ok(());
    };

    run_authorized(framed, request.hash.as_deref(), authorization, &state).await
}

/// Drive the handshake. `None` means the session was refused and the
/// connection should be dropped.
async fn authorize(
    framed: &mut Connection,
    request: &PairingRequest,
    state: &Arc<DaemonState>,
) -> Result<Option<Authorization>> {
    if let Some((device_id, token)) = request.credentials() {
        if verify_trusted(state, device_id, token).await {
            info!("Trusted device {device_id} connected");
            return Ok(Some(Authorization::Trusted));
        }
        debug!("Unknown credentials for {device_id}");
    }

    let pin = state.pins.issue().await;
    info!("Pairing requested, PIN issued");
    let host = state.host.clone();
    tokio::spawn(async move {
        let body = format!("Enter PIN on the device: {pin}");
        if let Err(e) = host.notify(NOTIFY_APP, NOTIFY_TITLE, &body).await {
            warn!("Failed to show pairing PIN: {e}");
        }
    });

    framed.send(Response::pin_required()).await?;

    let submitted = read_frame(framed, state.timings.pin_read)
        .await
        .and_then(|value| serde_json::from_value::<PinSubmission>(value).ok());

    let accepted = match submitted {
        Some(submission) => state.pins.verify(&submission.pin).await,
        None => false,
    };

    if !accepted {
        info!("Pairing refused");
        let _ = framed.send(Response::error(INVALID_PIN)).await;
        return Ok(None);
    }

    let device = mint_device();
    persist_device(state, device.clone()).await;
    info!("Paired new device {}", device.id);
    Ok(Some(Authorization::Paired(device)))
}

/// Check credentials against the trust store off the async workers.
async fn verify_trusted(state: &DaemonState, device_id: &str, token: &str) -> bool {
    let store = state.trusted.clone();
    let (device_id, token) = (device_id.to_string(), token.to_string());
    tokio::task::spawn_blocking(move || store.verify(&device_id, &token))
        .await
        .unwrap_or_else(|e| {
            warn!("Trust store lookup panicked: {e}");
            false
        })
}

/// Write freshly minted credentials. Failure is logged; the session still
/// proceeds with the credentials it was given.
async fn persist_device(state: &DaemonState, device: TrustedDevice) {
    let store = state.trusted.clone();
    let id = device.id.clone();
    match tokio::task::spawn_blocking(move || store.save(device)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Failed to persist paired device {id}: {e}"),
        Err(e) => warn!("Trust store write panicked for {id}: {e}"),
    }
}

async fn run_authorized(
    framed: Connection,
    client_hash: Option<&str>,
    authorization: Authorization,
    state: &Arc<DaemonState>,
) -> Result<()> {
    let (mut sink, mut stream) = framed.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let id = ConnectionId::new();

    let config = state.config.snapshot().await;
    let mut sync = Response::sync(client_hash, &config.ui);
    if let Authorization::Paired(device) = authorization {
        sync = sync.with_credentials(device.id, device.token);
    }
    let _ = tx.send(sync.into());
    drop(config);

    state.registry.register(id.clone(), tx).await;

    let media_state = state.clone();
    tokio::spawn(async move {
        media_state.broadcast_media_status().await;
    });

    let writer_id = id.clone();
    let mut writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sink.send(msg).await {
                warn!("Failed to send to {writer_id}: {e}");
                break;
            }
        }
        trace!("[{writer_id}] writer ended");
    });

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(value)) => dispatch(value, state).await,
                Some(Err(e)) => {
                    debug!("Read error from {id}: {e}");
                    break;
                }
                None => break,
            },
            _ = &mut writer => break,
        }
    }

    debug!("Connection closed: {id}");
    state.registry.unregister(&id).await;
    writer.abort();
    Ok(())
}

/// Handle one decoded message of an authorized session.
///
/// Objects that do not match any known message shape are logged and
/// skipped; only transport failures end a session.
pub async fn dispatch(value: Value, state: &Arc<DaemonState>) {
    if message_type(&value) == Some(SYS_INFO) {
        state.relay.offer(value);
        return;
    }

    let message: ClientMessage = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(e) => {
            debug!("Ignoring malformed message: {e}");
            return;
        }
    };

    match message {
        ClientMessage::Action { id, value } => {
            executor::execute(state, &id, value).await;
        }
        ClientMessage::Clipboard { content } => {
            let text = content.trim().to_string();
            if !text.is_empty() {
                let host = state.host.clone();
                tokio::spawn(async move {
                    if let Err(e) = host.write_clipboard(&text).await {
                        warn!("Failed to set clipboard: {e}");
                    }
                });
            }
        }
        ClientMessage::Notification {
            app,
            title,
            content,
        } => {
            let host = state.host.clone();
            tokio::spawn(async move {
                if let Err(e) = host.notify(&app, &title, &content).await {
                    warn!("Failed to forward notification: {e}");
                }
            });
        }
        ClientMessage::Ping => trace!("ping"),
        other => debug!("Ignoring {other:?}"),
    }
}
