//! Runtime options of the daemon.

use std::time::Duration;

use clap::ValueEnum;
use hyprlink_core::Directories;

pub const DEFAULT_PORT: u16 = hyprlink_rpc::DEFAULT_PORT;
pub const DEFAULT_DISCOVERY_PORT: u16 = 9999;

/// Which side of the UDP discovery exchange this daemon plays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DiscoveryMode {
    /// Answer device beacons with the TCP port
    #[default]
    Listen,
    /// Periodically broadcast our own hostname and port
    Beacon,
    /// No discovery
    Off,
}

/// Deadlines and tick intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Deadline for the first message of a connection
    pub first_read: Duration,
    /// Deadline for the PIN answer after a challenge
    pub pin_read: Duration,
    /// How long a relay call waits for the device reply
    pub relay: Duration,
    pub poll_interval: Duration,
    /// Upper bound on a single data-source command
    pub poll_command: Duration,
    pub clipboard_interval: Duration,
    pub media_interval: Duration,
    pub beacon_interval: Duration,
    /// Idle time before TCP keepalive starts checking an accepted socket
    pub keepalive: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            first_read: Duration::from_secs(15),
            pin_read: Duration::from_secs(60),
            relay: Duration::from_secs(7),
            poll_interval: Duration::from_secs(1),
            poll_command: Duration::from_secs(10),
            clipboard_interval: Duration::from_secs(2),
            media_interval: Duration::from_secs(1),
            beacon_interval: Duration::from_secs(2),
            keepalive: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub port: u16,
    pub dirs: Directories,
    pub discovery: DiscoveryMode,
    pub discovery_port: u16,
    pub timings: Timings,
}

impl ServerOptions {
    #[must_use]
    pub fn new(dirs: Directories) -> Self {
        Self {
            port: DEFAULT_PORT,
            dirs,
            discovery: DiscoveryMode::default(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            timings: Timings::default(),
        }
    }
}
