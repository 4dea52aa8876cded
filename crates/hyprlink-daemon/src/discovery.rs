//! UDP presence discovery.
//!
//! Two primitives share the discovery port:
//!
//! - [`run_responder`] listens for device beacons `{hostname, port}` and
//!   answers the sender with `HYPRLINK_ACK|<tcp_port>`.
//! - [`run_beacon`] periodically broadcasts our own `{hostname, port}` on the
//!   subnet for devices that only listen.
//!
//! A deployment runs one of the two; see [`DiscoveryMode`](crate::options::DiscoveryMode).

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use hyprlink_rpc::{Beacon, discovery_ack};
use tokio::net::UdpSocket;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, trace, warn};

use crate::error::{DaemonError, Result};

const MAX_DATAGRAM: usize = 4096;

/// Bind the discovery socket on all interfaces.
///
/// # Errors
///
/// Returns [`DaemonError::DiscoveryBind`] if the port is unavailable.
pub async fn bind(port: u16) -> Result<UdpSocket> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    UdpSocket::bind(addr)
        .await
        .map_err(|source| DaemonError::DiscoveryBind { addr, source })
}

/// Answer every beacon received on `socket` with our TCP port.
pub async fn run_responder(socket: UdpSocket, tcp_port: u16) {
    if let Ok(addr) = socket.local_addr() {
        info!("Discovery responder listening on UDP {addr}");
    }
    let ack = discovery_ack(tcp_port);
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        let (len, src) = match socket.recv_from(&mut buf).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Discovery recv error: {e}");
                continue;
            }
        };

        match serde_json::from_slice::<Beacon>(&buf[..len]) {
            Ok(beacon) => {
                debug!("Beacon from {} at {src}", beacon.hostname);
                if let Err(e) = socket.send_to(ack.as_bytes(), src).await {
                    warn!("Failed to acknowledge {src}: {e}");
                }
            }
            Err(e) => trace!("Ignoring datagram from {src}: {e}"),
        }
    }
}

/// Broadcast `beacon` to `target` every `every`.
pub async fn run_beacon(socket: UdpSocket, target: SocketAddr, beacon: Beacon, every: Duration) {
    if let Err(e) = socket.set_broadcast(true) {
        warn!("Cannot enable broadcast on discovery socket: {e}");
        return;
    }
    let payload = match serde_json::to_vec(&beacon) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Cannot encode beacon: {e}");
            return;
        }
    };
    info!("Broadcasting presence to {target} every {every:?}");

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = socket.send_to(&payload, target).await {
            debug!("Beacon send failed: {e}");
        }
    }
}

/// Subnet-wide broadcast address for `port`.
#[must_use]
pub fn broadcast_target(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::BROADCAST, port))
}
