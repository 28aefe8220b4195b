//! LocalEngine - durable file-backed storage.

use std::path::{Path, PathBuf};

use super::{kv_file, SyncStorage};
use crate::constants::STORE_FILE_NAME;
use crate::error::{StorageError, StorageResult};

/// Synchronous engine persisting records in a store file under a
/// caller-chosen directory.
///
/// Data survives process restarts until explicitly removed. Two engines
/// opened on the same directory share the same records; isolation between
/// concurrent writers comes from the atomic file replacement, not from
/// this engine.
#[derive(Debug)]
pub struct LocalEngine {
    path: PathBuf,
}

impl LocalEngine {
    /// Open (or create) the store under `data_dir`.
    ///
    /// # Errors
    /// Returns an init error when the directory cannot be created.
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            let err = StorageError::init(format!(
                "failed to create data directory {}: {e}",
                data_dir.display()
            ));
            tracing::error!("{err}");
            err
        })?;
        Ok(Self {
            path: data_dir.join(STORE_FILE_NAME),
        })
    }

    /// Path of the backing store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.path
    }
}

impl SyncStorage for LocalEngine {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        kv_file::get(&self.path, key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        kv_file::set(&self.path, key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        kv_file::remove(&self.path, key)
    }

    fn clear(&self) -> StorageResult<()> {
        kv_file::clear(&self.path)
    }
}
