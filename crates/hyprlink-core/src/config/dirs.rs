use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Application paths under the XDG config directory
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/hyprlink)
    pub config: PathBuf,

    /// Top-level config file listing hostname and profiles
    pub main_file: PathBuf,

    /// Importable module definitions
    pub modules: PathBuf,

    /// Importable profile definitions
    pub profiles: PathBuf,

    /// Optional stylesheet pushed to devices
    pub style_file: PathBuf,

    /// Paired devices
    pub trusted_devices: PathBuf,
}

pub const MAIN_FILENAME: &str = "main.json";
pub const STYLE_FILENAME: &str = "style.css";
pub const TRUSTED_DEVICES_FILENAME: &str = "trusted_devices.json";

impl Directories {
    /// Resolve the standard XDG config directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no home directory can be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "hyprlink")
            .ok_or_else(|| Error::Config("cannot determine home directory".to_string()))?;

        Ok(Self::with_base(project.config_dir().to_path_buf()))
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            main_file: base.join(MAIN_FILENAME),
            modules: base.join("modules"),
            profiles: base.join("profiles"),
            style_file: base.join(STYLE_FILENAME),
            trusted_devices: base.join(TRUSTED_DEVICES_FILENAME),
            config: base,
        }
    }

    /// Directories whose contents feed the UI description.
    #[must_use]
    pub fn watched(&self) -> Vec<&Path> {
        vec![&self.config, &self.modules, &self.profiles]
    }

    /// Ensure the config directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)
    }
}
