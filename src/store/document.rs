//! Atomic JSON document with a FIFO single-writer queue
//!
//! Write sequence:
//! 1. Serialize the full document
//! 2. Write to a temporary sibling file
//! 3. fsync the temporary file
//! 4. Rename over the target path
//!
//! A crash between any two steps leaves either the previous document or the
//! new one observable, never a mix. Reads outside the writer queue may be
//! stale relative to a queued write but can never see a torn file.

use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::warn;

use super::errors::{StoreError, StoreResult};

/// A single JSON document on disk.
///
/// `load` is self-healing: a missing document is created as the default and
/// a document that fails to parse (corrupt bytes, wrong top-level shape) is
/// reset to the default and persisted, never propagated as an error.
///
/// `update` serializes all writers: the tokio mutex wakes waiters in FIFO
/// order, so every read-modify-write runs against the latest completed write.
pub struct DocumentStore<T> {
    path: PathBuf,
    writer: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DocumentStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Creates a store backed by the document at `path`.
    ///
    /// The document itself is created lazily on first load or update.
    pub fn open(path: PathBuf) -> Self {
        Self {
            path,
            writer: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document, resetting it to the default if it is
    /// missing or malformed.
    pub fn load(&self) -> StoreResult<T> {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "malformed document, resetting to default"
                    );
                    let value = T::default();
                    self.write_atomic(&value)?;
                    Ok(value)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let value = T::default();
                self.write_atomic(&value)?;
                Ok(value)
            }
            Err(e) => Err(StoreError::read_failed(&self.path, e)),
        }
    }

    /// Runs one read-modify-write cycle inside the writer queue.
    ///
    /// The closure sees the latest completed document. If it fails, nothing
    /// is written; if it succeeds, the mutated document is persisted
    /// atomically before the queue slot is released.
    pub async fn update<R, E, F>(&self, mutate: F) -> Result<R, E>
    where
        F: FnOnce(&mut T) -> Result<R, E>,
        E: From<StoreError>,
    {
        let _slot = self.writer.lock().await;
        let mut doc = self.load()?;
        let out = mutate(&mut doc)?;
        self.write_atomic(&doc)?;
        Ok(out)
    }

    fn write_atomic(&self, value: &T) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::write_failed(&self.path, e))?;
            }
        }

        let data = serde_json::to_vec_pretty(value).map_err(|e| StoreError::EncodeFailed {
            path: self.path.clone(),
            source: e,
        })?;

        let tmp = temp_sibling(&self.path);
        let mut file = File::create(&tmp).map_err(|e| StoreError::write_failed(&tmp, e))?;
        file.write_all(&data)
            .map_err(|e| StoreError::write_failed(&tmp, e))?;
        file.sync_all()
            .map_err(|e| StoreError::write_failed(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| StoreError::write_failed(&self.path, e))
    }
}

/// Temporary sibling path used for the write-then-rename cycle.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
