//! TCP server and background task wiring.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hyprlink_core::TrustedDeviceStore;
use hyprlink_rpc::Beacon;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config_watcher;
use crate::discovery;
use crate::error::Result;
use crate::host::Host;
use crate::options::{DiscoveryMode, ServerOptions};
use crate::poller;
use crate::session::handle_connection;
use crate::state::DaemonState;
use crate::watchers;

/// Load configuration, start every background loop and serve forever.
///
/// # Errors
///
/// Returns an error if the config directory cannot be created or the TCP
/// port cannot be bound.
pub async fn run(options: ServerOptions, host: Arc<dyn Host>) -> Result<()> {
    options.dirs.ensure_exists()?;

    let state = Arc::new(DaemonState::new(
        TrustedDeviceStore::new(options.dirs.trusted_devices.clone()),
        host,
        options.timings,
    ));
    config_watcher::load_initial(&options.dirs, &state).await;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, options.port));
    let listener = TcpListener::bind(addr).await?;
    let port = listener.local_addr()?.port();
    info!("Listening on TCP {addr}");

    spawn_background(&state, &options, port).await;

    serve(listener, state).await;
    Ok(())
}

/// Start the poller, watchers, config reload and discovery loops.
pub async fn spawn_background(state: &Arc<DaemonState>, options: &ServerOptions, tcp_port: u16) {
    tokio::spawn(poller::run(state.clone()));
    tokio::spawn(watchers::watch_clipboard(state.clone()));
    tokio::spawn(watchers::watch_media(state.clone()));
    tokio::spawn(config_watcher::run(options.dirs.clone(), state.clone()));

    if options.discovery == DiscoveryMode::Off {
        debug!("Discovery disabled");
        return;
    }

    let socket = match discovery::bind(options.discovery_port).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Discovery unavailable: {e}");
            return;
        }
    };

    match options.discovery {
        DiscoveryMode::Listen => {
            tokio::spawn(discovery::run_responder(socket, tcp_port));
        }
        DiscoveryMode::Beacon => {
            let hostname = state.config.snapshot().await.ui.hostname.clone();
            let beacon = Beacon {
                hostname,
                port: tcp_port,
            };
            tokio::spawn(discovery::run_beacon(
                socket,
                discovery::broadcast_target(options.discovery_port),
                beacon,
                state.timings.beacon_interval,
            ));
        }
        DiscoveryMode::Off => {}
    }
}

/// Disable Nagle and turn on keepalive so dead peers are noticed.
///
/// # Errors
///
/// Returns the first socket option the OS refused.
pub fn configure_stream(stream: &TcpStream, keepalive: Duration) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let params = TcpKeepalive::new()
        .with_time(keepalive)
        .with_interval(keepalive);
    SockRef::from(stream).set_tcp_keepalive(&params)
}

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, state: Arc<DaemonState>) {
    info!("Ready to accept connections");
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("Accepted connection from {peer}");
                if let Err(e) = configure_stream(&stream, state.timings.keepalive) {
                    debug!("Failed to configure socket for {peer}: {e}");
                }
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("Connection error: {e}");
                    }
                });
            }
            Err(e) => {
                error!("Accept error: {e}");
            }
        }
    }
}
