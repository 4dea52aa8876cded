//! Get-request relay between the local CLI and a connected device.
//!
//! Device replies (`sys_info`) land in a small correlation slot. A relay call
//! drains stale entries, forwards the CLI request to one device and waits for
//! the next reply. Calls are serialized, so at most one is in flight.

use std::time::Duration;

use hyprlink_rpc::{NO_DEVICE, Outbound, Response, TIMEOUT};
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::registry::Registry;

/// Capacity of the correlation slot.
pub const SLOT_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct Relay {
    slot_tx: mpsc::Sender<Value>,
    slot_rx: Mutex<mpsc::Receiver<Value>>,
    timeout: Duration,
}

impl Relay {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let (slot_tx, slot_rx) = mpsc::channel(SLOT_CAPACITY);
        Self {
            slot_tx,
            slot_rx: Mutex::new(slot_rx),
            timeout,
        }
    }

    /// Hand a device reply to the relay. Returns `false` if the slot is full
    /// and the reply was dropped.
    pub fn offer(&self, reply: Value) -> bool {
        match self.slot_tx.try_send(reply) {
            Ok(()) => true,
            Err(e) => {
                debug!("Correlation slot rejected device reply: {e}");
                false
            }
        }
    }

    /// Forward `request` to an arbitrary connected device and wait for its
    /// reply. Always produces exactly one message for the caller.
    pub async fn call(&self, registry: &Registry, request: Value) -> Outbound {
        let mut slot = self.slot_rx.lock().await;

        let Some((id, device)) = registry.any().await else {
            info!("Relay request with no device connected");
            return Response::error(NO_DEVICE).into();
        };

        let mut stale = 0;
        while slot.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            debug!("Discarded {stale} stale device replies");
        }

        if device.send(Outbound::Raw(request)).is_err() {
            registry.unregister(&id).await;
            return Response::error(NO_DEVICE).into();
        }
        debug!("Forwarded get_request to {id}");

        match tokio::time::timeout(self.timeout, slot.recv()).await {
            Ok(Some(reply)) => Outbound::Raw(reply),
            Ok(None) | Err(_) => {
                warn!("Device {id} did not answer within {:?}", self.timeout);
                Response::error(TIMEOUT).into()
            }
        }
    }
}
