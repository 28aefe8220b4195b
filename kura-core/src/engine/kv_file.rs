//! Single-file JSON map shared by the session and local engines.
//!
//! The whole map is read per operation and atomically replaced per
//! mutation (write to a temp file in the same directory, then rename), so
//! a concurrent reader never observes a half-written store.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::error::{StorageError, StorageResult};

fn backend_err(context: &str, cause: impl std::fmt::Display) -> StorageError {
    let err = StorageError::backend(format!("{context}: {cause}"));
    tracing::error!("{err}");
    err
}

/// Read the map at `path`. A missing file is an empty map.
fn load(path: &Path) -> StorageResult<BTreeMap<String, String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(backend_err("failed to read store file", e)),
    };
    serde_json::from_str(&text).map_err(|e| backend_err("store file is corrupt", e))
}

/// Atomically replace the map at `path`.
fn store(path: &Path, entries: &BTreeMap<String, String>) -> StorageResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| backend_err("store path has no parent directory", path.display()))?;
    let text = serde_json::to_string(entries)
        .map_err(|e| backend_err("failed to encode store file", e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| backend_err("failed to create temp store file", e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| backend_err("failed to write store file", e))?;
    tmp.persist(path)
        .map_err(|e| backend_err("failed to replace store file", e))?;
    Ok(())
}

pub(crate) fn get(path: &Path, key: &str) -> StorageResult<Option<String>> {
    Ok(load(path)?.get(key).cloned())
}

pub(crate) fn set(path: &Path, key: &str, value: &str) -> StorageResult<()> {
    let mut entries = load(path)?;
    entries.insert(key.to_string(), value.to_string());
    store(path, &entries)
}

pub(crate) fn remove(path: &Path, key: &str) -> StorageResult<()> {
    let mut entries = load(path)?;
    if entries.remove(key).is_some() {
        store(path, &entries)?;
    }
    Ok(())
}

pub(crate) fn clear(path: &Path) -> StorageResult<()> {
    store(path, &BTreeMap::new())
}
