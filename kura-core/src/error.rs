//! Storage error types.
//!
//! TigerStyle: explicit taxonomy, message-bearing variants, helper
//! constructors so call sites stay terse.
//!
//! Every error in this crate is caught at the manager boundary and turned
//! into the caller's default value (reads) or silent completion (writes);
//! nothing here escapes [`StorageManager`](crate::manager::StorageManager)'s
//! public operations.

use thiserror::Error;

/// Errors from engines, serializers, and the manager boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A backend primitive call failed (I/O, lock, database).
    #[error("backend error: {0}")]
    Backend(String),

    /// A value could not be encoded to its stored string form.
    #[error("serialize error: {0}")]
    Serialize(String),

    /// Stored text is not valid for the configured serializer.
    #[error("deserialize error: {0}")]
    Deserialize(String),

    /// The backend could not be opened or created.
    #[error("init error: {0}")]
    Init(String),
}

impl StorageError {
    /// Backend-access failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Encoding failure.
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize(message.into())
    }

    /// Decoding failure.
    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::Deserialize(message.into())
    }

    /// Backend open/create failure.
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init(message.into())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StorageError::backend("disk full");
        assert_eq!(err.to_string(), "backend error: disk full");

        let err = StorageError::deserialize("not json");
        assert_eq!(err.to_string(), "deserialize error: not json");
    }
}
