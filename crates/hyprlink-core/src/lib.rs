//! Configuration facade and trust store for the HyprLink daemon.
//!
//! - [`config`]: XDG paths, the UI description builder, the directory watcher
//! - [`trusted`]: devices remembered after PIN pairing

pub mod config;
pub mod trusted;

mod error;

pub use config::{BuiltConfig, ConfigWatcher, Directories, build_config, watch_config};
pub use error::{Error, Result};
pub use trusted::{
    DEFAULT_DEVICE_NAME, TrustedDeviceStore, device_id_for, generate_token, mint_device,
};

pub use hyprlink_types::*;
