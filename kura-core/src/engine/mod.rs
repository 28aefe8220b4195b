//! Storage engines - swappable backends behind one uniform contract.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       StorageEngine                          │
//! ├──────────┬───────────┬──────────┬──────────┬────────────────┤
//! │  Memory  │  Session  │  Local   │   Sim    │   Database     │
//! │  (sync)  │  (sync)   │  (sync)  │  (sync)  │   (async)      │
//! └──────────┴───────────┴──────────┴──────────┴────────────────┘
//! ```
//!
//! Every engine exposes the same four operations: `get_item`, `set_item`,
//! `remove_item`, `clear`. `get_item` on a missing key returns `Ok(None)`,
//! never an error. Synchronous engines complete before returning; the
//! database engine resolves its futures only once the operation's
//! transaction has committed.

use async_trait::async_trait;

use crate::error::StorageResult;

mod kv_file;
mod local;
mod memory;
mod session;
mod sim;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use local::LocalEngine;
pub use memory::MemoryEngine;
pub use session::SessionEngine;
pub use sim::{FaultConfig, SimEngine};

#[cfg(feature = "sqlite")]
pub use sqlite::{DatabaseEngine, DatabaseEngineConfig};

/// Uniform synchronous storage contract.
///
/// Operations complete before returning and never suspend.
pub trait SyncStorage: Send + Sync {
    /// Fetch the stored text for `key`. `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns a backend error when the underlying primitive fails.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any prior value.
    ///
    /// # Errors
    /// Returns a backend error when the underlying primitive fails.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns a backend error when the underlying primitive fails.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Remove every record.
    ///
    /// # Errors
    /// Returns a backend error when the underlying primitive fails.
    fn clear(&self) -> StorageResult<()>;
}

/// Uniform asynchronous storage contract.
///
/// Operations resolve only once their effect is durable in the backend.
#[async_trait]
pub trait AsyncStorage: Send + Sync {
    /// Fetch the stored text for `key`. `Ok(None)` when absent.
    ///
    /// # Errors
    /// Returns an init error when the backend cannot be opened, or a
    /// backend error when the request or its transaction fails.
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any prior value.
    ///
    /// # Errors
    /// Returns an init error when the backend cannot be opened, or a
    /// backend error when the request or its transaction fails.
    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns an init error when the backend cannot be opened, or a
    /// backend error when the request or its transaction fails.
    async fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Remove every record.
    ///
    /// # Errors
    /// Returns an init error when the backend cannot be opened, or a
    /// backend error when the request or its transaction fails.
    async fn clear(&self) -> StorageResult<()>;
}

/// The closed set of storage engines.
///
/// Whether an engine is synchronous or asynchronous is a pure function of
/// the variant, so the flag is immutable for the lifetime of an engine
/// value and the facade can route each call with one tagged check.
#[derive(Debug)]
pub enum StorageEngine {
    /// Process-local map; nothing survives the process.
    Memory(MemoryEngine),
    /// Temp-directory backed; data lives exactly as long as the engine.
    Session(SessionEngine),
    /// Durable file-backed store at a caller-chosen path.
    Local(LocalEngine),
    /// Deterministic fault-injecting engine for tests.
    Sim(SimEngine),
    /// SQLite-backed store; the only asynchronous engine.
    #[cfg(feature = "sqlite")]
    Database(DatabaseEngine),
}

/// One dispatch target, chosen once per facade call.
pub(crate) enum Dispatch<'a> {
    /// Route through the synchronous code path.
    Sync(&'a dyn SyncStorage),
    /// Route through the asynchronous code path.
    #[cfg(feature = "sqlite")]
    Async(&'a DatabaseEngine),
}

impl StorageEngine {
    /// Whether operations on this engine complete through a future.
    #[must_use]
    pub fn is_async(&self) -> bool {
        match self.dispatch() {
            Dispatch::Sync(_) => false,
            #[cfg(feature = "sqlite")]
            Dispatch::Async(_) => true,
        }
    }

    pub(crate) fn dispatch(&self) -> Dispatch<'_> {
        match self {
            Self::Memory(engine) => Dispatch::Sync(engine),
            Self::Session(engine) => Dispatch::Sync(engine),
            Self::Local(engine) => Dispatch::Sync(engine),
            Self::Sim(engine) => Dispatch::Sync(engine),
            #[cfg(feature = "sqlite")]
            Self::Database(engine) => Dispatch::Async(engine),
        }
    }

    /// The engine's synchronous contract, when it has one.
    #[must_use]
    pub fn as_sync(&self) -> Option<&dyn SyncStorage> {
        match self.dispatch() {
            Dispatch::Sync(engine) => Some(engine),
            #[cfg(feature = "sqlite")]
            Dispatch::Async(_) => None,
        }
    }
}

impl From<MemoryEngine> for StorageEngine {
    fn from(engine: MemoryEngine) -> Self {
        Self::Memory(engine)
    }
}

impl From<SessionEngine> for StorageEngine {
    fn from(engine: SessionEngine) -> Self {
        Self::Session(engine)
    }
}

impl From<LocalEngine> for StorageEngine {
    fn from(engine: LocalEngine) -> Self {
        Self::Local(engine)
    }
}

impl From<SimEngine> for StorageEngine {
    fn from(engine: SimEngine) -> Self {
        Self::Sim(engine)
    }
}

#[cfg(feature = "sqlite")]
impl From<DatabaseEngine> for StorageEngine {
    fn from(engine: DatabaseEngine) -> Self {
        Self::Database(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_async_follows_the_variant() {
        assert!(!StorageEngine::from(MemoryEngine::new()).is_async());

        #[cfg(feature = "sqlite")]
        {
            let engine = DatabaseEngine::new(DatabaseEngineConfig::default());
            assert!(StorageEngine::from(engine).is_async());
        }
    }

    #[test]
    fn test_sync_contract_access() {
        let engine = StorageEngine::from(MemoryEngine::new());
        assert!(engine.as_sync().is_some());

        #[cfg(feature = "sqlite")]
        {
            let engine = StorageEngine::from(DatabaseEngine::new(DatabaseEngineConfig::default()));
            assert!(engine.as_sync().is_none());
        }
    }
}
