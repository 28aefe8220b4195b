//! SessionEngine - storage scoped to one session.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{kv_file, SyncStorage};
use crate::constants::STORE_FILE_NAME;
use crate::error::{StorageError, StorageResult};

/// Synchronous engine whose data lives exactly as long as the engine.
///
/// Records are kept in a store file inside an engine-owned temporary
/// directory. Dropping the engine removes the directory and everything in
/// it; that removal is the end of the session.
#[derive(Debug)]
pub struct SessionEngine {
    // Held for its Drop: removing the TempDir ends the session.
    dir: TempDir,
    path: PathBuf,
}

impl SessionEngine {
    /// Create a fresh session scope.
    ///
    /// # Errors
    /// Returns an init error when the temporary directory cannot be
    /// created.
    pub fn new() -> StorageResult<Self> {
        let dir = TempDir::new().map_err(|e| {
            let err = StorageError::init(format!("failed to create session directory: {e}"));
            tracing::error!("{err}");
            err
        })?;
        let path = dir.path().join(STORE_FILE_NAME);
        Ok(Self { dir, path })
    }

    /// Path of the backing store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.path
    }

    /// Path of the session directory.
    #[must_use]
    pub fn session_dir(&self) -> &Path {
        self.dir.path()
    }
}

impl SyncStorage for SessionEngine {
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
