//! Configuration loading and hot reload.

use std::sync::Arc;

use hyprlink_core::{Directories, build_config, watch_config};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::state::DaemonState;

/// Build the configuration at startup. A broken configuration leaves the
/// daemon serving an empty description.
pub async fn load_initial(dirs: &Directories, state: &DaemonState) {
    match build_config(dirs) {
        Ok(built) => state.update_config(built.ui, built.actions).await,
        Err(e) => warn!("Starting with an empty configuration: {e}"),
    }
}

/// Rebuild the configuration and push it to every session.
///
/// Returns `false` when the build failed and the previous configuration was
/// kept.
pub async fn reload(dirs: &Directories, state: &DaemonState) -> bool {
    match build_config(dirs) {
        Ok(built) => {
            let ui = built.ui.clone();
            state.update_config(built.ui, built.actions).await;
            let sessions = state.broadcast_update(&ui).await;
            info!("Config reloaded, pushed to {sessions} sessions");
            true
        }
        Err(e) => {
            error!("Failed to reload config, keeping previous: {e}");
            false
        }
    }
}

/// Watch the config directories and reload on every settled change.
pub async fn run(dirs: Directories, state: Arc<DaemonState>) {
    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel::<()>();
    let _watcher = watch_config(&dirs, reload_tx);

    while reload_rx.recv().await.is_some() {
        debug!("Config reload event received");
        reload(&dirs, &state).await;
    }

    debug!("Config watcher task ended");
}
