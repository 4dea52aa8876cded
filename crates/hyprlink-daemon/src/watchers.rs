//! Clipboard and media-player watchers.

use std::sync::Arc;

use hyprlink_rpc::Response;
use tokio::time::{MissedTickBehavior, interval};
use tracing::trace;

use crate::state::DaemonState;

/// Broadcast the host clipboard whenever it changes to something non-empty.
pub async fn watch_clipboard(state: Arc<DaemonState>) {
    let mut ticker = interval(state.timings.clipboard_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = String::new();

    loop {
        ticker.tick().await;
        match state.host.read_clipboard().await {
            Ok(current) => {
                if let Some(update) = clipboard_change(&mut last, &current) {
                    state.registry.broadcast(update).await;
                }
            }
            Err(e) => trace!("Clipboard read failed: {e}"),
        }
    }
}

/// Compare a fresh clipboard read against the last one seen.
///
/// Returns the update to broadcast and remembers `current` when it is
/// non-empty and differs from `last`.
pub fn clipboard_change(last: &mut String, current: &str) -> Option<Response> {
    let current = current.trim();
    if current.is_empty() || current == last.as_str() {
        return None;
    }
    current.clone_into(last);
    Some(Response::clipboard(current))
}

/// Broadcast media-player state on every tick, changed or not.
pub async fn watch_media(state: Arc<DaemonState>) {
    let mut ticker = interval(state.timings.media_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        state.broadcast_media_status().await;
    }
}
