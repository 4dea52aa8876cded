mod builder;
mod dirs;
mod watcher;

pub use builder::{BuiltConfig, build_config, content_hash, machine_hostname};
pub use dirs::{Directories, MAIN_FILENAME, STYLE_FILENAME, TRUSTED_DEVICES_FILENAME};
pub use watcher::{ConfigWatcher, RELOAD_DEBOUNCE, is_relevant, watch_config};
