//! Kura Core - uniform key-value persistence facade.
//!
//! One interface over swappable storage backends. Callers read and write
//! typed values through a [`StorageManager`]; the medium (synchronous or
//! asynchronous) and the on-the-wire string form stay pluggable.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              StorageManager                  │
//! │   prefix + serializer + engine dispatch      │
//! ├──────────────────────┬──────────────────────┤
//! │  Serializer          │  JSON / ISO dates    │
//! │  StorageEngine       │  memory / session /  │
//! │                      │  local / sim /       │
//! │                      │  database (async)    │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! # Error policy
//!
//! Best effort, always. Every failure is caught at the manager boundary,
//! logged with its severity, and resolved to the caller's default value
//! (reads) or silent completion (writes). A storage fault never crashes
//! the calling code; the trade is that callers cannot distinguish "key
//! absent" from "read failed".
//!
//! # Usage
//!
//! ```rust
//! use kura_core::{StorageConfig, StorageManager};
//!
//! let manager = StorageManager::create(StorageConfig::default());
//! manager.set("greeting", &"hello").ready();
//! let value = manager.get("greeting", String::new()).ready().unwrap();
//! assert_eq!(value, "hello");
//! ```
//!
//! Against the asynchronous engine the same operations return pending
//! completions; drive them with [`Completion::wait`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod engine;
pub mod error;
pub mod manager;
pub mod serializer;

// Re-export common types
pub use constants::*;
pub use engine::{
    AsyncStorage, FaultConfig, LocalEngine, MemoryEngine, SessionEngine, SimEngine,
    StorageEngine, SyncStorage,
};
#[cfg(feature = "sqlite")]
pub use engine::{DatabaseEngine, DatabaseEngineConfig};
pub use error::{StorageError, StorageResult};
pub use manager::{Completion, StorageConfig, StorageManager};
pub use serializer::{DateSerializer, JsonSerializer, Serializer};
