//! Broadcast registry of authorized device connections.

use std::collections::HashMap;

use hyprlink_rpc::Outbound;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, trace};

/// Identity of one accepted TCP connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound queue of one connection, drained by its writer task.
pub type ConnectionSender = mpsc::UnboundedSender<Outbound>;

/// Every session that reached the authorized state.
///
/// All mutation and iteration happen under one lock, so a broadcast is atomic
/// with respect to connections joining or leaving.
#[derive(Debug, Default)]
pub struct Registry {
    connections: Mutex<HashMap<ConnectionId, ConnectionSender>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: ConnectionId, sender: ConnectionSender) {
        let mut connections = self.connections.lock().await;
        connections.insert(id.clone(), sender);
        debug!("Registered connection {id} ({} total)", connections.len());
    }

    /// Remove a connection. Dropping its sender ends its writer task.
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(id).is_some();
        if removed {
            debug!("Unregistered connection {id} ({} left)", connections.len());
        }
        removed
    }

    /// Queue `message` for every connection, pruning the ones that are gone.
    ///
    /// Returns the number of connections the message was queued for.
    pub async fn broadcast(&self, message: impl Into<Outbound>) -> usize {
        let message = message.into();
        let mut connections = self.connections.lock().await;

        connections.retain(|id, sender| {
            if sender.send(message.clone()).is_ok() {
                true
            } else {
                debug!("Dropping dead connection {id}");
                false
            }
        });

        trace!("Broadcast to {} connections", connections.len());
        connections.len()
    }

    /// Any one registered connection.
    pub async fn any(&self) -> Option<(ConnectionId, ConnectionSender)> {
        let connections = self.connections.lock().await;
        connections
            .iter()
            .find(|(_, sender)| !sender.is_closed())
            .map(|(id, sender)| (id.clone(), sender.clone()))
    }

    pub async fn len(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.lock().await.is_empty()
    }
}
