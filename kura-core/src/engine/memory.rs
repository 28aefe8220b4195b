//! MemoryEngine - process-local synchronous storage.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::SyncStorage;
use crate::error::{StorageError, StorageResult};

/// In-memory engine backed by a process-local map.
///
/// Each instance owns its own map: two engines never observe each other's
/// writes. Nothing persists across process restarts.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryEngine {
    /// Create an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries.lock().map_err(|_| {
            let err = StorageError::backend("memory map lock poisoned");
            tracing::error!("{err}");
            err
        })
    }
}

impl SyncStorage for MemoryEngine {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.entries()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let engine = MemoryEngine::new();

        assert_eq!(engine.get_item("k").unwrap(), None);

        engine.set_item("k", "v").unwrap();
        assert_eq!(engine.get_item("k").unwrap(), Some("v".to_string()));

        engine.set_item("k", "v2").unwrap();
        assert_eq!(engine.get_item("k").unwrap(), Some("v2".to_string()));

        engine.remove_item("k").unwrap();
        assert_eq!(engine.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let engine = MemoryEngine::new();
        engine.remove_item("never-written").unwrap();
    }

    #[test]
    fn test_clear() {
        let engine = MemoryEngine::new();
        engine.set_item("a", "1").unwrap();
        engine.set_item("b", "2").unwrap();

        engine.clear().unwrap();

        assert_eq!(engine.get_item("a").unwrap(), None);
        assert_eq!(engine.get_item("b").unwrap(), None);
    }

    #[test]
    fn test_instances_are_isolated() {
        let first = MemoryEngine::new();
        let second = MemoryEngine::new();

        first.set_item("shared-key", "mine").unwrap();

        assert_eq!(second.get_item("shared-key").unwrap(), None);
    }
}
