//! HyprLink daemon.
//!
//! Bridges paired devices on the LAN to the desktop: serves the configured
//! UI description, runs device actions, and streams module values,
//! clipboard and media state back to every authorized connection.
//!
//! # Architecture
//!
//! - [`server`]: TCP listener and background task wiring
//! - [`session`]: Per-connection pairing state machine and dispatch
//! - [`registry`]: Fan-out to every authorized connection
//! - [`relay`]: Forwards CLI `get_request` queries to a device
//! - [`executor`]: Media and shell actions
//! - [`poller`]: Periodic module data sources
//! - [`watchers`]: Clipboard and media-player watchers
//! - [`discovery`]: UDP presence exchange
//! - [`config_watcher`]: Initial load and hot reload
//! - [`host`]: Side effects on the desktop, behind the [`Host`] trait

pub mod config_watcher;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod host;
pub mod options;
pub mod pin;
pub mod poller;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod state;
pub mod watchers;

#[cfg(test)]
mod test_support;

pub use error::{DaemonError, Result};
pub use host::{Host, MediaCommand, SystemHost};
pub use options::{DEFAULT_DISCOVERY_PORT, DEFAULT_PORT, DiscoveryMode, ServerOptions, Timings};
pub use server::{run, serve};
pub use state::DaemonState;
