//! SimEngine - deterministic fault injection for storage tests.
//!
//! > "If you're not testing with fault injection, you're not testing."
//!
//! A seeded in-memory engine whose operations fail with configurable
//! probability. Same seed, same fault sequence, so a failing run is
//! reproducible from its seed alone.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::SyncStorage;
use crate::error::{StorageError, StorageResult};

/// Failure probabilities for a [`SimEngine`].
#[derive(Debug, Clone, Copy)]
pub struct FaultConfig {
    /// Probability that a read fails, in `0.0..=1.0`.
    pub read_fail: f64,
    /// Probability that a mutation (set/remove/clear) fails, in `0.0..=1.0`.
    pub write_fail: f64,
}

impl FaultConfig {
    /// No faults: behaves like [`MemoryEngine`](super::MemoryEngine).
    #[must_use]
    pub fn none() -> Self {
        Self {
            read_fail: 0.0,
            write_fail: 0.0,
        }
    }

    /// Fail every operation: a deterministic failing backend double.
    #[must_use]
    pub fn always() -> Self {
        Self {
            read_fail: 1.0,
            write_fail: 1.0,
        }
    }
}

#[derive(Debug)]
struct SimState {
    entries: HashMap<String, String>,
    rng: ChaCha8Rng,
}

/// In-memory engine with seeded, reproducible fault injection.
#[derive(Debug)]
pub struct SimEngine {
    state: Mutex<SimState>,
    faults: FaultConfig,
}

impl SimEngine {
    /// Create the engine with the given seed and fault configuration.
    ///
    /// # Panics
    /// Panics if a fault probability is outside `0.0..=1.0`.
    #[must_use]
    pub fn new(seed: u64, faults: FaultConfig) -> Self {
        // Preconditions
        assert!(
            (0.0..=1.0).contains(&faults.read_fail),
            "read_fail {} outside 0.0..=1.0",
            faults.read_fail
        );
        assert!(
            (0.0..=1.0).contains(&faults.write_fail),
            "write_fail {} outside 0.0..=1.0",
            faults.write_fail
        );

        Self {
            state: Mutex::new(SimState {
                entries: HashMap::new(),
                rng: ChaCha8Rng::seed_from_u64(seed),
            }),
            faults,
        }
    }

    fn roll(&self, state: &mut SimState, probability: f64, operation: &str) -> StorageResult<()> {
        if state.rng.gen_bool(probability) {
            let err = StorageError::backend(format!("injected {operation} fault"));
            tracing::error!("{err}");
            return Err(err);
        }
        Ok(())
    }

    fn state(&self) -> StorageResult<std::sync::MutexGuard<'_, SimState>> {
        self.state.lock().map_err(|_| {
            let err = StorageError::backend("sim state lock poisoned");
            tracing::error!("{err}");
            err
        })
    }
}

impl SyncStorage for SimEngine {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let mut state = self.state()?;
        self.roll(&mut state, self.faults.read_fail, "read")?;
        Ok(state.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut state = self.state()?;
        self.roll(&mut state, self.faults.write_fail, "write")?;
        state.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut state = self.state()?;
        self.roll(&mut state, self.faults.write_fail, "remove")?;
        state.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut state = self.state()?;
        self.roll(&mut state, self.faults.write_fail, "clear")?;
        state.entries.clear();
        Ok(())
    }
}
