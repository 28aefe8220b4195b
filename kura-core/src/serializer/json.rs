//! JsonSerializer - the default structural codec.

use serde_json::Value;

use super::Serializer;
use crate::constants::{CIRCULAR_SENTINEL, SERIALIZE_DEPTH_MAX};
use crate::error::{StorageError, StorageResult};

/// Default serializer: structural JSON encoding.
///
/// Traversal is bounded at [`SERIALIZE_DEPTH_MAX`]: any subtree nested
/// deeper is replaced by the [`CIRCULAR_SENTINEL`] marker so serialization
/// still completes. The substitution is lossy; a value carrying the
/// sentinel does not round-trip.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Create the serializer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether any subtree sits at or below the depth cutoff.
    fn exceeds_depth(value: &Value, depth: usize) -> bool {
        if depth >= SERIALIZE_DEPTH_MAX {
            return true;
        }
        match value {
            Value::Array(items) => items.iter().any(|v| Self::exceeds_depth(v, depth + 1)),
            Value::Object(map) => map.values().any(|v| Self::exceeds_depth(v, depth + 1)),
            _ => false,
        }
    }

    /// Rebuild the tree with too-deep subtrees replaced by the sentinel.
    fn bound_depth(value: &Value, depth: usize) -> Value {
        if depth >= SERIALIZE_DEPTH_MAX {
            return Value::String(CIRCULAR_SENTINEL.to_string());
        }
        match value {
            Value::Array(items) => Value::Array(
                items.iter().map(|v| Self::bound_depth(v, depth + 1)).collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::bound_depth(v, depth + 1)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value) -> StorageResult<String> {
        if Self::exceeds_depth(value, 0) {
            let bounded = Self::bound_depth(value, 0);
            return serde_json::to_string(&bounded)
                .map_err(|e| StorageError::serialize(format!("failed to encode value: {e}")));
        }
        serde_json::to_string(value)
            .map_err(|e| StorageError::serialize(format!("failed to encode value: {e}")))
    }

    fn deserialize(&self, text: &str) -> StorageResult<Value> {
        serde_json::from_str(text)
            .map_err(|e| StorageError::deserialize(format!("invalid JSON: {e}")))
    }
}
