//! Shared state injected into every session and background loop.

use std::sync::Arc;

use hyprlink_core::{BuiltConfig, TrustedDeviceStore};
use hyprlink_rpc::Response;
use hyprlink_types::{ActionMap, UiDescription};
use tokio::sync::RwLock;
use tracing::{info, trace};

use crate::host::Host;
use crate::options::Timings;
use crate::pin::PinIssuer;
use crate::registry::Registry;
use crate::relay::Relay;

/// Current configuration snapshot.
///
/// Readers clone the `Arc` and release the lock immediately; a reload swaps
/// description and action map together.
#[derive(Debug, Default)]
pub struct SharedConfig {
    current: RwLock<Arc<BuiltConfig>>,
}

impl SharedConfig {
    pub async fn snapshot(&self) -> Arc<BuiltConfig> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, ui: UiDescription, actions: ActionMap) {
        *self.current.write().await = Arc::new(BuiltConfig { ui, actions });
    }
}

pub struct DaemonState {
    pub config: SharedConfig,
    pub registry: Registry,
    pub pins: PinIssuer,
    pub trusted: TrustedDeviceStore,
    pub relay: Relay,
    pub host: Arc<dyn Host>,
    pub timings: Timings,
}

impl DaemonState {
    #[must_use]
    pub fn new(trusted: TrustedDeviceStore, host: Arc<dyn Host>, timings: Timings) -> Self {
        Self {
            config: SharedConfig::default(),
            registry: Registry::new(),
            pins: PinIssuer::new(),
            trusted,
            relay: Relay::new(timings.relay),
            host,
            timings,
        }
    }

    /// Swap in a new description and action map.
    pub async fn update_config(&self, ui: UiDescription, actions: ActionMap) {
        info!(
            "Config updated: {} ({} actions, hash {})",
            ui.hostname,
            actions.len(),
            ui.hash
        );
        self.config.replace(ui, actions).await;
    }

    /// Push a layout change to every authorized session.
    pub async fn broadcast_update(&self, ui: &UiDescription) -> usize {
        self.registry.broadcast(Response::layout_update(ui)).await
    }

    /// Query the media player and push its state to every session.
    pub async fn broadcast_media_status(&self) -> usize {
        let status = self.host.media_status().await;
        trace!("Media status: {status:?}");
        self.registry.broadcast(Response::media_info(&status)).await
    }
}
