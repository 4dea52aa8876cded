//! Persistent store of devices that completed PIN pairing.
//!
//! The file is a JSON object keyed by device id. It is re-read on every
//! lookup so manual edits revoke access without a restart. Writes are
//! read-modify-write without file locking; only one daemon owns the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hyprlink_types::TrustedDevice;
use rand::RngCore;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::error::Result;

/// Display name given to every newly paired device.
pub const DEFAULT_DEVICE_NAME: &str = "Android Device";

const DEVICE_ID_PREFIX: &str = "phone-";
const TOKEN_BYTES: usize = 32;

pub type DeviceMap = HashMap<String, TrustedDevice>;

#[derive(Debug, Clone)]
pub struct TrustedDeviceStore {
    path: PathBuf,
}

impl TrustedDeviceStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all trusted devices. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<DeviceMap> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeviceMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `(device_id, token)` matches a stored device.
    ///
    /// Unreadable stores authorize nobody.
    #[must_use]
    pub fn verify(&self, device_id: &str, token: &str) -> bool {
        let devices = match self.load() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Cannot read trusted devices {}: {e}", self.path.display());
                return false;
            }
        };

        devices.get(device_id).is_some_and(|device| {
            bool::from(device.token.as_bytes().ct_eq(token.as_bytes()))
        })
    }

    /// Insert or replace one device, keeping every other entry.
    ///
    /// An existing file that does not parse is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the current file cannot be read or parsed, or
    /// if the new contents cannot be written.
    pub fn save(&self, device: TrustedDevice) -> Result<()> {
        let mut devices = self.load()?;
        devices.insert(device.id.clone(), device);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&devices)?;
        std::fs::write(&self.path, data)?;

        debug!("Saved {} trusted devices", devices.len());
        Ok(())
    }
}

/// Fresh credentials for a device that just confirmed its PIN.
///
/// Id and token come from independent random draws.
#[must_use]
pub fn mint_device() -> TrustedDevice {
    TrustedDevice {
        id: device_id_for(&generate_token()),
        token: generate_token(),
        name: DEFAULT_DEVICE_NAME.to_string(),
    }
}

/// 32 random bytes, hex encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Device id derived from the first eight characters of its token.
#[must_use]
pub fn device_id_for(token: &str) -> String {
    let short: String = token.chars().take(8).collect();
    format!("{DEVICE_ID_PREFIX}{short}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, TrustedDeviceStore) {
        let temp = TempDir::new().unwrap();
        let store = TrustedDeviceStore::new(temp.path().join("trusted_devices.json"));
        (temp, store)
    }

    fn pair(store: &TrustedDeviceStore) -> TrustedDevice {
        let device = mint_device();
        store.save(device.clone()).unwrap();
        device
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_temp, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.verify("phone-1", "t"));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_minted_id_is_not_token_prefix() {
        let device = mint_device();
        assert_eq!(device.id.len(), "phone-".len() + 8);
        assert!(!device.token.starts_with(&device.id["phone-".len()..]));
    }

    #[test]
    fn test_device_id_uses_token_prefix() {
        assert_eq!(device_id_for("abcdef0123456789"), "phone-abcdef01");
    }

    #[test]
    fn test_pair_then_verify() {
        let (_temp, store) = store();

        let device = pair(&store);

        assert!(device.id.starts_with("phone-"));
        assert_eq!(device.name, DEFAULT_DEVICE_NAME);
        assert!(store.verify(&device.id, &device.token));
        assert!(!store.verify(&device.id, "wrong"));
        assert!(!store.verify("phone-unknown", &device.token));
    }

    #[test]
    fn test_save_keeps_other_entries() {
        let (_temp, store) = store();

        let first = pair(&store);
        let second = pair(&store);

        let devices = store.load().unwrap();
        assert_eq!(devices.len(), 2);
        assert!(store.verify(&first.id, &first.token));
        assert!(store.verify(&second.id, &second.token));
    }

    #[test]
    fn test_file_format_is_keyed_map() {
        let (_temp, store) = store();
        let device = pair(&store);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();

        assert_eq!(raw[&device.id]["id"], device.id.as_str());
        assert_eq!(raw[&device.id]["token"], device.token.as_str());
        assert_eq!(raw[&device.id]["name"], "Android Device");
    }

    #[test]
    fn test_manual_edit_revokes_token() {
        let (_temp, store) = store();
        let device = pair(&store);

        std::fs::write(store.path(), "{}").unwrap();

        assert!(!store.verify(&device.id, &device.token));
    }

    #[test]
    fn test_corrupt_file_authorizes_nobody() {
        let (_temp, store) = store();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(store.load().is_err());
        assert!(!store.verify("phone-1", "t"));
    }

    #[test]
    fn test_save_refuses_to_overwrite_corrupt_file() {
        let (_temp, store) = store();
        std::fs::write(store.path(), "{\"phone-1\": ").unwrap();

        assert!(store.save(mint_device()).is_err());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{\"phone-1\": ");
    }
}
