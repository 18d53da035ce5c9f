//! Vendor command templates
//!
//! The entire device-family-specific surface: four RouterOS command strings.
//! Targeting a different device family means swapping only these.

/// Saves a binary system snapshot; the device writes `<name>.backup`.
pub fn save_backup(name: &str) -> String {
    format!("/system backup save name={name}")
}

/// Exports the full configuration; the device writes `<name>.rsc`.
pub fn export_config(name: &str) -> String {
    format!("/export file={name}")
}

/// Removes a named file from device storage. Best-effort cleanup only.
pub fn remove_file(file_name: &str) -> String {
    format!("/file remove \"{file_name}\"")
}

/// Read-only status command used as a connectivity probe.
pub const STATUS_PROBE: &str = "/system resource print";
