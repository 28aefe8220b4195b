//! Serializers - pluggable value/string codecs.
//!
//! A serializer turns a value into the string an engine stores and back
//! again. The facade applies whichever serializer it is configured with;
//! engines only ever see strings.

use serde_json::Value;

use crate::error::StorageResult;

mod date;
mod json;

pub use date::DateSerializer;
pub use json::JsonSerializer;

/// Converts a value to its stored string form and back.
///
/// Implementations must be pure and stateless. Round-trip contract:
/// `deserialize(serialize(v))` reconstructs a value equal to `v` for every
/// value the implementation documents support for.
pub trait Serializer: Send + Sync {
    /// Encode a value to its stored string form.
    ///
    /// # Errors
    /// Returns a serialize error when the value is outside the
    /// implementation's supported domain.
    fn serialize(&self, value: &Value) -> StorageResult<String>;

    /// Decode stored text back into a value.
    ///
    /// # Errors
    /// Returns a deserialize error when the text is malformed.
    fn deserialize(&self, text: &str) -> StorageResult<Value>;
}
