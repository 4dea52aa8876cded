//! Config directory watcher for hot-reload support.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info};

use super::dirs::{Directories, TRUSTED_DEVICES_FILENAME};
use crate::error::Result;

/// Quiet period after the last relevant event before a reload is signalled.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

pub struct ConfigWatcher {
    _watcher_thread: std::thread::JoinHandle<()>,
    _bridge_thread: std::thread::JoinHandle<()>,
}

/// Watch the config directory and its import directories.
///
/// A burst of changes produces one `()` on `tx` once the directory has been
/// quiet for [`RELOAD_DEBOUNCE`].
#[must_use]
pub fn watch_config(dirs: &Directories, tx: tokio_mpsc::UnboundedSender<()>) -> ConfigWatcher {
    let watched: Vec<PathBuf> = dirs
        .watched()
        .into_iter()
        .filter(|dir| dir.is_dir())
        .map(Path::to_path_buf)
        .collect();
    let (sync_tx, sync_rx) = mpsc::channel::<()>();

    let watcher_thread = std::thread::spawn(move || {
        if let Err(e) = watch_dirs(&watched, &sync_tx) {
            error!("Config watcher error: {e}");
        }
    });

    let bridge_thread = std::thread::spawn(move || {
        while sync_rx.recv().is_ok() {
            loop {
                match sync_rx.recv_timeout(RELOAD_DEBOUNCE) {
                    Ok(()) => {}
                    Err(mpsc::RecvTimeoutError::Timeout) => break,
                    Err(mpsc::RecvTimeoutError::Disconnected) => return,
                }
            }

            debug!("Config changed, sending reload notification");
            if tx.send(()).is_err() {
                debug!("Config reload receiver dropped, stopping watcher");
                break;
            }
        }
        debug!("Config watcher channel closed");
    });

    ConfigWatcher {
        _watcher_thread: watcher_thread,
        _bridge_thread: bridge_thread,
    }
}

/// Whether a change to `path` can affect the built description.
#[must_use]
pub fn is_relevant(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.starts_with('.') && name != TRUSTED_DEVICES_FILENAME
}

fn watch_dirs(dirs: &[PathBuf], tx: &mpsc::Sender<()>) -> Result<()> {
    let (watcher_tx, watcher_rx) = mpsc::channel();

    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => match event.kind {
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
                    if event.paths.iter().any(|p| is_relevant(p)) {
                        let _ = watcher_tx.send(());
                    }
                }
                _ => {}
            },
            Err(e) => error!("Watcher error: {e}"),
        })?;

    for dir in dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        info!("Watching config directory: {}", dir.display());
    }

    while watcher_rx.recv().is_ok() {
        if tx.send(()).is_err() {
            break;
        }
    }

    Ok(())
}
