//! Named limits and defaults.
//!
//! TigerStyle: every magic number gets a name and a unit.

/// Store file name used by the session and local engines.
pub const STORE_FILE_NAME: &str = "kura_store.json";

/// Default database file for the asynchronous engine.
pub const DATABASE_FILE_DEFAULT: &str = "kura.db";

/// Default record table name for the asynchronous engine.
pub const STORE_NAME_DEFAULT: &str = "kura_kv";

/// Default schema version stamped into the database at open.
pub const STORE_VERSION_DEFAULT: u32 = 1;

/// Connection pool ceiling for the asynchronous engine.
pub const DATABASE_POOL_CONNECTIONS_MAX: u32 = 5;

/// Maximum value-tree depth the JSON serializer will traverse.
pub const SERIALIZE_DEPTH_MAX: usize = 128;

/// Sentinel substituted for subtrees nested beyond [`SERIALIZE_DEPTH_MAX`].
///
/// Values carrying the sentinel do not round-trip.
pub const CIRCULAR_SENTINEL: &str = "[Circular]";
