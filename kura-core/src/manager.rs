//! StorageManager - the persistence facade.
//!
//! One engine + one serializer + a key prefix. Callers read and write
//! typed values; the facade prefixes keys, applies the serializer, and
//! routes each call through the engine's synchronous or asynchronous path
//! with a single tagged check. Failures never escape: they are logged and
//! the operation resolves to the caller's default (reads) or completes
//! silently (writes). A failed read is indistinguishable from a miss.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

#[cfg(feature = "sqlite")]
use crate::engine::AsyncStorage;
use crate::engine::{Dispatch, MemoryEngine, StorageEngine};
use crate::error::StorageError;
use crate::serializer::{JsonSerializer, Serializer};

/// Outcome of a facade operation: immediate for synchronous engines, a
/// future for the asynchronous engine.
///
/// Synchronous engines never suspend, so their operations never construct
/// a future; the asynchronous engine always does. A pending completion
/// runs when its future is polled: drop it unawaited and the operation
/// never reaches the backend.
#[must_use = "a pending completion does nothing until awaited"]
pub enum Completion<T> {
    /// The operation completed synchronously; the value is here.
    Ready(T),
    /// The operation completes when the future resolves.
    Pending(BoxFuture<'static, T>),
}

impl<T> Completion<T> {
    /// The value, when the operation completed synchronously.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Pending(_) => None,
        }
    }

    /// Whether the operation is still pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Drive the operation to completion, whichever variant it is.
    pub async fn wait(self) -> T {
        match self {
            Self::Ready(value) => value,
            Self::Pending(future) => future.await,
        }
    }
}

/// Facade configuration.
///
/// Absent fields keep their current value: the crate defaults at creation,
/// the prior values at reconfiguration. An explicitly empty prefix
/// (`Some(String::new())`) clears the prefix; `None` leaves it as is.
#[derive(Default)]
pub struct StorageConfig {
    /// Storage engine. Creation default: in-memory.
    pub engine: Option<StorageEngine>,
    /// Value serializer. Creation default: JSON.
    pub serializer: Option<Arc<dyn Serializer>>,
    /// Key prefix, prepended to every key presented to the engine.
    pub prefix: Option<String>,
}

impl StorageConfig {
    /// Config with the given engine.
    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<StorageEngine>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Config with the given serializer.
    #[must_use]
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    /// Config with the given key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Uniform key-value persistence facade.
///
/// Stateless across calls beyond its held configuration; each operation is
/// an independent request against the configured engine.
pub struct StorageManager {
    engine: StorageEngine,
    serializer: Arc<dyn Serializer>,
    prefix: String,
}

impl StorageManager {
    // Instances come from `create`; the constructor stays private.
    fn new(config: StorageConfig) -> Self {
        Self {
            engine: config
                .engine
                .unwrap_or_else(|| StorageEngine::Memory(MemoryEngine::new())),
            serializer: config
                .serializer
                .unwrap_or_else(|| Arc::new(JsonSerializer::new())),
            prefix: config.prefix.unwrap_or_default(),
        }
    }

    /// Create a facade. Defaults: in-memory engine, JSON serializer, no
    /// prefix.
    #[must_use]
    pub fn create(config: StorageConfig) -> Self {
        Self::new(config)
    }

    /// Replace any subset of engine, serializer, and prefix.
    ///
    /// Safe to call at any time; takes effect on the next operation and
    /// never retroactively affects operations already in flight.
    pub fn configure(&mut self, config: StorageConfig) {
        if let Some(engine) = config.engine {
            self.engine = engine;
        }
        if let Some(serializer) = config.serializer {
            self.serializer = serializer;
        }
        if let Some(prefix) = config.prefix {
            self.prefix = prefix;
        }
    }

    /// The configured engine.
    #[must_use]
    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// The configured key prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_key(&self, key: &str) -> String {
        // Precondition
        assert!(!key.is_empty(), "key cannot be empty");
        format!("{}{}", self.prefix, key)
    }

    /// Store `value` under `key`.
    ///
    /// Serialization happens eagerly, before dispatch, on both paths.
    /// Failures are logged and swallowed; the operation always completes.
    ///
    /// # Panics
    /// Panics if `key` is empty.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Completion<()> {
        let full_key = self.full_key(key);

        let encoded = serde_json::to_value(value)
            .map_err(|e| {
                StorageError::serialize(format!("value for {full_key:?} is not serializable: {e}"))
            })
            .and_then(|v| self.serializer.serialize(&v));
        let text = match encoded {
            Ok(text) => text,
            Err(e) => {
                warn!("set {full_key:?} dropped: {e}");
                return Completion::Ready(());
            }
        };

        match self.engine.dispatch() {
            Dispatch::Sync(engine) => {
                if let Err(e) = engine.set_item(&full_key, &text) {
                    warn!("set {full_key:?} dropped: {e}");
                }
                Completion::Ready(())
            }
            #[cfg(feature = "sqlite")]
            Dispatch::Async(engine) => {
                let engine = engine.clone();
                Completion::Pending(Box::pin(async move {
                    if let Err(e) = engine.set_item(&full_key, &text).await {
                        warn!("set {full_key:?} dropped: {e}");
                    }
                }))
            }
        }
    }

    /// Fetch the value under `key`, or `default` when the key is absent
    /// or anything fails along the way.
    ///
    /// An absent key short-circuits to the default without touching the
    /// serializer. A failed read is logged and behaves exactly like a
    /// miss.
    ///
    /// # Panics
    /// Panics if `key` is empty.
    pub fn get<T>(&self, key: &str, default: T) -> Completion<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let full_key = self.full_key(key);

        match self.engine.dispatch() {
            Dispatch::Sync(engine) => {
                let value = match engine.get_item(&full_key) {
                    Ok(Some(text)) => decode(self.serializer.as_ref(), &full_key, &text, default),
                    Ok(None) => default,
                    Err(e) => {
                        warn!("get {full_key:?} defaulted: {e}");
                        default
                    }
                };
                Completion::Ready(value)
            }
            #[cfg(feature = "sqlite")]
            Dispatch::Async(engine) => {
                let engine = engine.clone();
                let serializer = Arc::clone(&self.serializer);
                Completion::Pending(Box::pin(async move {
                    match engine.get_item(&full_key).await {
                        Ok(Some(text)) => decode(serializer.as_ref(), &full_key, &text, default),
                        Ok(None) => default,
                        Err(e) => {
                            warn!("get {full_key:?} defaulted: {e}");
                            default
                        }
                    }
                }))
            }
        }
    }

    /// Remove the record under `key`. Failures are logged and swallowed.
    ///
    /// # Panics
    /// Panics if `key` is empty.
    pub fn remove(&self, key: &str) -> Completion<()> {
        let full_key = self.full_key(key);

        match self.engine.dispatch() {
            Dispatch::Sync(engine) => {
                if let Err(e) = engine.remove_item(&full_key) {
                    warn!("remove {full_key:?} dropped: {e}");
                }
                Completion::Ready(())
            }
            #[cfg(feature = "sqlite")]
            Dispatch::Async(engine) => {
                let engine = engine.clone();
                Completion::Pending(Box::pin(async move {
                    if let Err(e) = engine.remove_item(&full_key).await {
                        warn!("remove {full_key:?} dropped: {e}");
                    }
                }))
            }
        }
    }

    /// Remove every record in the engine. Failures are logged and
    /// swallowed.
    pub fn clear(&self) -> Completion<()> {
        match self.engine.dispatch() {
            Dispatch::Sync(engine) => {
                if let Err(e) = engine.clear() {
                    warn!("clear dropped: {e}");
                }
                Completion::Ready(())
            }
            #[cfg(feature = "sqlite")]
            Dispatch::Async(engine) => {
                let engine = engine.clone();
                Completion::Pending(Box::pin(async move {
                    if let Err(e) = engine.clear().await {
                        warn!("clear dropped: {e}");
                    }
                }))
            }
        }
    }
}

/// Deserialize stored text, falling back to the default on any failure.
fn decode<T: DeserializeOwned>(
    serializer: &dyn Serializer,
    full_key: &str,
    text: &str,
    default: T,
) -> T {
    let decoded = serializer.deserialize(text).and_then(|value| {
        serde_json::from_value(value).map_err(|e| {
            StorageError::deserialize(format!(
                "stored value for {full_key:?} does not match the requested type: {e}"
            ))
        })
    });
    match decoded {
        Ok(value) => value,
        Err(e) => {
            warn!("get {full_key:?} defaulted: {e}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FaultConfig, SimEngine, SyncStorage};

    #[test]
    fn test_defaults() {
        let manager = StorageManager::create(StorageConfig::default());

        assert!(!manager.engine().is_async());
        assert_eq!(manager.prefix(), "");
    }

    #[test]
    fn test_set_get_round_trip() {
        let manager = StorageManager::create(StorageConfig::default());

        manager.set("answer", &42u32).ready().unwrap();
        let value = manager.get("answer", 0u32).ready().unwrap();

        assert_eq!(value, 42);
    }

    #[test]
    fn test_missing_key_returns_default() {
        let manager = StorageManager::create(StorageConfig::default());

        let value = manager.get("never-written", "fallback".to_string());
        assert_eq!(value.ready().unwrap(), "fallback");
    }

    #[test]
    fn test_prefix_is_applied_on_the_engine_side() {
        let mut manager = StorageManager::create(StorageConfig::default());
        manager.configure(StorageConfig::default().with_prefix("p_"));

        manager.set("k", &1u8).ready().unwrap();

        let Some(engine) = manager.engine().as_sync() else {
            panic!("memory engine is sync");
        };
        assert!(engine.get_item("p_k").unwrap().is_some());
        assert_eq!(engine.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_prefix_can_be_cleared_with_an_empty_string() {
        let mut manager =
            StorageManager::create(StorageConfig::default().with_prefix("p_"));
        assert_eq!(manager.prefix(), "p_");

        // None leaves the prefix alone.
        manager.configure(StorageConfig::default());
        assert_eq!(manager.prefix(), "p_");

        // An explicit empty string clears it.
        manager.configure(StorageConfig::default().with_prefix(""));
        assert_eq!(manager.prefix(), "");
    }

    #[test]
    fn test_failing_backend_is_swallowed_and_defaulted() {
        let engine = SimEngine::new(42, FaultConfig::always());
        let manager =
            StorageManager::create(StorageConfig::default().with_engine(engine));

        // Writes complete silently, reads resolve to the default.
        manager.set("k", &1u8).ready().unwrap();
        let value = manager.get("k", 99u8).ready().unwrap();

        assert_eq!(value, 99);
    }

    #[test]
    fn test_malformed_stored_text_falls_back_to_default() {
        let manager = StorageManager::create(StorageConfig::default());

        let Some(engine) = manager.engine().as_sync() else {
            panic!("memory engine is sync");
        };
        engine.set_item("k", "{not json").unwrap();

        let value = manager.get("k", "fallback".to_string()).ready().unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_type_mismatch_falls_back_to_default() {
        let manager = StorageManager::create(StorageConfig::default());

        manager.set("k", &"text").ready().unwrap();
        let value = manager.get("k", 7u32).ready().unwrap();

        assert_eq!(value, 7);
    }

    #[test]
    #[should_panic(expected = "key cannot be empty")]
    fn test_empty_key_panics() {
        let manager = StorageManager::create(StorageConfig::default());
        let _ = manager.set("", &1u8);
    }
}
