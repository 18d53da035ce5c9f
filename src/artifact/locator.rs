//! Filesystem scan over the backup root
//!
//! Layout produced by the session client:
//!
//! ```text
//! <root>/<safe-device-name>/backup/<safe>_backup_<stamp>.backup
//! <root>/<safe-device-name>/export/<safe>_export_<stamp>.rsc
//! ```
//!
//! Missing directories are zero artifacts, not an error: the root only
//! exists once a first backup has been taken.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::warn;

use super::errors::{ArtifactError, ArtifactResult};
use super::naming::{parse_artifact_name, safe_name, ArtifactKind};

/// One artifact file with its resolved metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    /// Safe device name, from the filename or the containing directory.
    pub device: String,
    /// `None` when the filename does not follow the naming convention.
    pub kind: Option<ArtifactKind>,
    /// From the filename stamp, falling back to filesystem times.
    pub timestamp: NaiveDateTime,
    pub size: u64,
}

/// Scans and deletes artifacts under one backup root.
pub struct ArtifactLocator {
    root: PathBuf,
}

impl ArtifactLocator {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Lists artifacts newest-first, optionally scoped to one device.
    pub fn list(&self, device: Option<&str>) -> ArtifactResult<Vec<ArtifactFile>> {
        let device_dirs = match device {
            Some(name) => vec![self.root.join(safe_name(name))],
            None => self.device_dirs()?,
        };

        let mut files = Vec::new();
        for dir in device_dirs {
            for kind in [ArtifactKind::Backup, ArtifactKind::Export] {
                self.scan_dir(&dir.join(kind.subdir()), &dir, &mut files)?;
            }
        }

        files.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(files)
    }

    /// Deletes the pair the given file belongs to.
    ///
    /// The sibling's path is derived from the shared device-name and
    /// timestamp components. When the filename's timestamp cannot be parsed
    /// there is no way to derive a sibling, so only the given file goes.
    /// Returns the paths actually deleted.
    pub fn delete_pair(&self, path: &Path) -> ArtifactResult<Vec<PathBuf>> {
        let parsed = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_artifact_name);

        let mut deleted = Vec::new();
        fs::remove_file(path).map_err(|e| ArtifactError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        deleted.push(path.to_path_buf());

        if let Some(parsed) = parsed {
            // <device-dir>/<kind>/<file> -> up two levels, down the sibling's
            // kind directory.
            let sibling = path
                .parent()
                .and_then(Path::parent)
                .map(|device_dir| {
                    device_dir
                        .join(parsed.kind.sibling().subdir())
                        .join(parsed.sibling_file_name())
                });

            if let Some(sibling) = sibling {
                if sibling.exists() {
                    fs::remove_file(&sibling).map_err(|e| ArtifactError::DeleteFailed {
                        path: sibling.clone(),
                        source: e,
                    })?;
                    deleted.push(sibling);
                }
            }
        }

        Ok(deleted)
    }

    fn device_dirs(&self) -> ArtifactResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ArtifactError::ScanFailed {
                    path: self.root.clone(),
                    source: e,
                })
            }
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::ScanFailed {
                path: self.root.clone(),
                source: e,
            })?;
            if entry.path().is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn scan_dir(
        &self,
        dir: &Path,
        device_dir: &Path,
        out: &mut Vec<ArtifactFile>,
    ) -> ArtifactResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(ArtifactError::ScanFailed {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| ArtifactError::ScanFailed {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable artifact");
                    continue;
                }
            };

            let parsed = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_artifact_name);

            let timestamp = match &parsed {
                Some(p) => p.stamp,
                None => filesystem_timestamp(&metadata),
            };
            let device = match &parsed {
                Some(p) => p.device.clone(),
                None => device_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };

            out.push(ArtifactFile {
                path,
                device,
                kind: parsed.map(|p| p.kind),
                timestamp,
                size: metadata.len(),
            });
        }

        Ok(())
    }
}

/// Creation time where available, else modification time, else now.
fn filesystem_timestamp(metadata: &fs::Metadata) -> NaiveDateTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(|t| DateTime::<Local>::from(t).naive_local())
        .unwrap_or_else(|_| Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, device: &str, kind: &str, file: &str) -> PathBuf {
        let dir = root.join(device).join(kind);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        fs::write(&path, b"data").unwrap();
        path
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let locator = ArtifactLocator::new(dir.path().join("nope"));
        assert!(locator.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_newest_first() {
        let dir = TempDir::new().unwrap();
        touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260801_100000.backup",
        );
        touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260803_100000.backup",
        );
        touch(
            dir.path(),
            "core1",
            "export",
            "core1_export_20260802_100000.rsc",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let files = locator.list(Some("core1")).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files[0].timestamp > files[1].timestamp);
        assert!(files[1].timestamp > files[2].timestamp);
    }

    #[test]
    fn test_list_all_devices() {
        let dir = TempDir::new().unwrap();
        touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260801_100000.backup",
        );
        touch(
            dir.path(),
            "edge1",
            "export",
            "edge1_export_20260801_110000.rsc",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let files = locator.list(None).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_unparseable_name_uses_filesystem_time() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "core1", "backup", "stray-file.backup");

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let files = locator.list(Some("core1")).unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].kind.is_none());
        assert_eq!(files[0].device, "core1");
    }

    #[test]
    fn test_delete_pair_from_backup_half() {
        let dir = TempDir::new().unwrap();
        let backup = touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260806_120000.backup",
        );
        let export = touch(
            dir.path(),
            "core1",
            "export",
            "core1_export_20260806_120000.rsc",
        );
        let other = touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260806_130000.backup",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let deleted = locator.delete_pair(&backup).unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(!backup.exists());
        assert!(!export.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_delete_pair_from_export_half() {
        let dir = TempDir::new().unwrap();
        let backup = touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260806_120000.backup",
        );
        let export = touch(
            dir.path(),
            "core1",
            "export",
            "core1_export_20260806_120000.rsc",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let deleted = locator.delete_pair(&export).unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(!backup.exists());
        assert!(!export.exists());
    }

    #[test]
    fn test_delete_single_when_unparseable() {
        let dir = TempDir::new().unwrap();
        let stray = touch(dir.path(), "core1", "backup", "stray.backup");
        let kept = touch(
            dir.path(),
            "core1",
            "export",
            "core1_export_20260806_120000.rsc",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let deleted = locator.delete_pair(&stray).unwrap();

        assert_eq!(deleted, vec![stray.clone()]);
        assert!(!stray.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_delete_pair_missing_sibling() {
        let dir = TempDir::new().unwrap();
        let backup = touch(
            dir.path(),
            "core1",
            "backup",
            "core1_backup_20260806_120000.backup",
        );

        let locator = ArtifactLocator::new(dir.path().to_path_buf());
        let deleted = locator.delete_pair(&backup).unwrap();

        assert_eq!(deleted, vec![backup]);
    }
}
