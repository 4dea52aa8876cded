//! Action execution.
//!
//! An action id resolves either to a built-in media operation or to the
//! shell template of a module. Commands run detached from the session that
//! requested them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::host::MediaCommand;
use crate::state::DaemonState;

/// What an action id resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Media(MediaCommand),
    Shell(String),
}

/// Resolve an action against the current action map.
pub async fn resolve(state: &DaemonState, id: &str, value: f64) -> Option<Resolved> {
    if let Some(media) = MediaCommand::from_action(id, value) {
        return Some(Resolved::Media(media));
    }
    let config = state.config.snapshot().await;
    config.actions.render(id, value).map(Resolved::Shell)
}

/// Run the action for `id` in the background.
///
/// Unknown ids are ignored. Returns the handle of the spawned task, mostly
/// for tests.
pub async fn execute(state: &Arc<DaemonState>, id: &str, value: f64) -> Option<JoinHandle<()>> {
    let Some(resolved) = resolve(state, id, value).await else {
        debug!("No action registered for '{id}'");
        return None;
    };

    let state = state.clone();
    let id = id.to_string();
    Some(tokio::spawn(async move {
        match resolved {
            Resolved::Media(command) => {
                if let Err(e) = state.host.media(command).await {
                    warn!("[{id}] Media command failed: {e}");
                }
                state.broadcast_media_status().await;
            }
            Resolved::Shell(command) => {
                debug!("[{id}] Executing: {command}");
                if let Err(e) = state.host.run_shell(&command).await {
                    warn!("[{id}] Command failed: {e}");
                }
            }
        }
    }))
}
