//! Device registry
//!
//! Durable mapping of device name to SSH connection profile. Names are
//! unique under trimmed, case-insensitive comparison; all mutations run
//! through the document store's single-writer queue so concurrent add and
//! remove calls cannot interleave their read-modify-write cycles.

mod errors;

pub use errors::{RegistryError, RegistryResult};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::DocumentStore;

/// Default SSH port applied when a device omits one.
pub const DEFAULT_SSH_PORT: u16 = 22;

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// One registered device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Device {
    /// Checks the add-flow invariants: every required field non-empty after
    /// trimming, port in range.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyField("name"));
        }
        if self.host.trim().is_empty() {
            return Err(RegistryError::EmptyField("host"));
        }
        if self.username.trim().is_empty() {
            return Err(RegistryError::EmptyField("username"));
        }
        if self.password.is_empty() {
            return Err(RegistryError::EmptyField("password"));
        }
        if self.port == 0 {
            return Err(RegistryError::InvalidPort);
        }
        Ok(())
    }
}

/// Trimmed, case-insensitive device name comparison.
///
/// The single matching rule for registry lookups, removals and duplicate
/// detection.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// The device registry document.
pub struct DeviceRegistry {
    store: DocumentStore<Vec<Device>>,
}

impl DeviceRegistry {
    /// Opens the registry backed by `<data_dir>/devices.json`.
    pub fn open(data_dir: &Path) -> Self {
        Self {
            store: DocumentStore::open(data_dir.join("devices.json")),
        }
    }

    /// Lists registered devices in insertion order.
    ///
    /// A missing or malformed document is reset to empty, never an error.
    pub fn list(&self) -> RegistryResult<Vec<Device>> {
        Ok(self.store.load()?)
    }

    /// Looks up one device by name.
    pub fn find(&self, name: &str) -> RegistryResult<Option<Device>> {
        Ok(self
            .store
            .load()?
            .into_iter()
            .find(|d| names_match(&d.name, name)))
    }

    /// Validates and appends a device.
    ///
    /// Runs inside the writer queue: the duplicate check and the append see
    /// the same document revision.
    pub async fn add(&self, device: Device) -> RegistryResult<Device> {
        device.validate()?;
        self.store
            .update(move |devices| {
                if devices.iter().any(|d| names_match(&d.name, &device.name)) {
                    return Err(RegistryError::DuplicateName(device.name.trim().to_string()));
                }
                devices.push(device.clone());
                Ok(device)
            })
            .await
    }

    /// Removes the device matching `name`.
    pub async fn remove(&self, name: &str) -> RegistryResult<Device> {
        let name = name.trim().to_string();
        self.store
            .update(move |devices| {
                match devices.iter().position(|d| names_match(&d.name, &name)) {
                    Some(idx) => Ok(devices.remove(idx)),
                    None => Err(RegistryError::NotFound(name.clone())),
                }
            })
            .await
    }
}
