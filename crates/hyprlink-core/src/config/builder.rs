//! Builds the UI description and action map from the config directory.
//!
//! Layout:
//! ```text
//! ~/.config/hyprlink/
//!   main.json          {"hostname": "...", "profiles": [<profile> | "import-name"]}
//!   profiles/<n>.json  {"name": "...", "modules": [<module> | "import-name"]}
//!   modules/<n>.json   <module>
//!   style.css
//! ```

use std::collections::HashSet;
use std::path::Path;

use hyprlink_types::{ActionMap, Module, Tab, UiDescription};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::dirs::Directories;
use crate::error::{Error, Result};

const FALLBACK_HOSTNAME: &str = "hyprlink";

/// A freshly built description together with the actions derived from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltConfig {
    pub ui: UiDescription,
    pub actions: ActionMap,
}

#[derive(Debug, Deserialize)]
struct MainConfig {
    #[serde(default)]
    hostname: Option<String>,
    #[serde(default)]
    profiles: Vec<Entry<ProfileConfig>>,
}

#[derive(Debug, Deserialize)]
struct ProfileConfig {
    name: String,
    #[serde(default)]
    modules: Vec<Entry<Module>>,
}

/// Either an inline definition or the name of a file to import.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Entry<T> {
    Import(String),
    Inline(T),
}

/// Build the description from `dirs`.
///
/// # Errors
///
/// Returns an error if `main.json` is missing or any present file is not
/// valid JSON. Imports that name missing files are skipped.
pub fn build_config(dirs: &Directories) -> Result<BuiltConfig> {
    let main_data = std::fs::read_to_string(&dirs.main_file).map_err(|e| {
        Error::Config(format!("cannot read {}: {e}", dirs.main_file.display()))
    })?;
    let main: MainConfig = serde_json::from_str(&main_data)?;

    let mut profiles = Vec::with_capacity(main.profiles.len());
    for entry in main.profiles {
        let profile = match entry {
            Entry::Inline(profile) => profile,
            Entry::Import(name) => match load_import::<ProfileConfig>(&dirs.profiles, &name)? {
                Some(profile) => profile,
                None => continue,
            },
        };
        profiles.push(resolve_profile(dirs, profile)?);
    }

    let css = match std::fs::read_to_string(&dirs.style_file) {
        Ok(css) => css,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut ui = UiDescription {
        hostname: main
            .hostname
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(machine_hostname),
        hash: String::new(),
        profiles,
        css,
    };
    warn_duplicate_ids(&ui);
    ui.hash = content_hash(&ui)?;

    let actions = ActionMap::from_description(&ui);
    debug!(
        "Built config: {} profiles, {} modules, {} actions, hash {}",
        ui.profiles.len(),
        ui.module_count(),
        actions.len(),
        ui.hash
    );

    Ok(BuiltConfig { ui, actions })
}

/// Lowercase hex SHA-256 of the description serialized without its hash.
///
/// Data sources never go on the wire, so each module's source is folded in
/// after the JSON, in walk order, to make source edits change the hash too.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn content_hash(ui: &UiDescription) -> Result<String> {
    let unhashed = UiDescription {
        hash: String::new(),
        ..ui.clone()
    };
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&unhashed)?);
    ui.walk(&mut |module| {
        if let Some(source) = &module.capabilities.source {
            hasher.update([0u8]);
            hasher.update(module.id.as_bytes());
            hasher.update([0u8]);
            hasher.update(source.as_bytes());
        }
    });
    Ok(hex::encode(hasher.finalize()))
}

fn resolve_profile(dirs: &Directories, profile: ProfileConfig) -> Result<Tab> {
    let mut modules = Vec::with_capacity(profile.modules.len());
    for entry in profile.modules {
        match entry {
            Entry::Inline(module) => modules.push(module),
            Entry::Import(name) => {
                if let Some(module) = load_import::<Module>(&dirs.modules, &name)? {
                    modules.push(module);
                }
            }
        }
    }

    Ok(Tab {
        name: profile.name,
        modules,
    })
}

fn load_import<T: serde::de::DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<T>> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        warn!("Ignoring invalid import name {name:?}");
        return Ok(None);
    }

    let path = dir.join(format!("{name}.json"));
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Import {name:?} not found at {}, skipping", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

fn warn_duplicate_ids(ui: &UiDescription) {
    let mut seen = HashSet::new();
    ui.walk(&mut |module| {
        if !seen.insert(module.id.as_str()) {
            warn!("Duplicate module id {:?}, later definition wins for actions", module.id);
        }
    });
}

/// Machine hostname: `$HOSTNAME`, then `/etc/hostname`, then a fixed fallback.
#[must_use]
pub fn machine_hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}
