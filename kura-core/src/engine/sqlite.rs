//! DatabaseEngine - asynchronous SQLite-backed storage.
//!
//! The only asynchronous engine. The database is opened lazily on first
//! use and the open is memoized in a shared cell, so every operation
//! issued before the open completes awaits the same in-flight open
//! instead of triggering another one. Each operation runs in its own
//! transaction and resolves only after that transaction commits, so a
//! resolved future means the effect is durable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;

use super::AsyncStorage;
use crate::constants::{
    DATABASE_FILE_DEFAULT, DATABASE_POOL_CONNECTIONS_MAX, STORE_NAME_DEFAULT,
    STORE_VERSION_DEFAULT,
};
use crate::error::{StorageError, StorageResult};

fn backend_err(context: &str, cause: impl std::fmt::Display) -> StorageError {
    let err = StorageError::backend(format!("{context}: {cause}"));
    tracing::error!("{err}");
    err
}

fn init_err(context: &str, cause: impl std::fmt::Display) -> StorageError {
    let err = StorageError::init(format!("{context}: {cause}"));
    tracing::error!("{err}");
    err
}

/// Configuration for a [`DatabaseEngine`]. Absent fields take the
/// crate defaults.
#[derive(Debug, Clone, Default)]
pub struct DatabaseEngineConfig {
    /// Database file path. Defaults to
    /// [`DATABASE_FILE_DEFAULT`](crate::constants::DATABASE_FILE_DEFAULT).
    pub db_path: Option<PathBuf>,
    /// Record table name. Defaults to
    /// [`STORE_NAME_DEFAULT`](crate::constants::STORE_NAME_DEFAULT).
    pub store_name: Option<String>,
    /// Schema version stamped into `PRAGMA user_version` at open.
    /// Defaults to
    /// [`STORE_VERSION_DEFAULT`](crate::constants::STORE_VERSION_DEFAULT).
    pub version: Option<u32>,
}

/// Asynchronous engine over an embedded SQLite database.
///
/// Cloning is cheap and clones share the same memoized connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseEngine {
    db_path: PathBuf,
    store_name: String,
    version: u32,
    pool: Arc<OnceCell<SqlitePool>>,
}

impl DatabaseEngine {
    /// Create the engine. The database itself is opened on first use.
    ///
    /// # Panics
    /// Panics if the configured store name is not a plain identifier
    /// (ASCII alphanumerics and underscores); the name is interpolated
    /// into SQL.
    #[must_use]
    pub fn new(config: DatabaseEngineConfig) -> Self {
        let store_name = config
            .store_name
            .unwrap_or_else(|| STORE_NAME_DEFAULT.to_string());

        // Precondition
        assert!(
            !store_name.is_empty()
                && store_name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'),
            "store name must be a plain identifier, got {store_name:?}"
        );

        Self {
            db_path: config
                .db_path
                .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_DEFAULT)),
            store_name,
            version: config.version.unwrap_or(STORE_VERSION_DEFAULT),
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Database file path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Record table name.
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Schema version the engine opens at.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The memoized open. Concurrent callers await the same in-flight
    /// open; once it succeeds the pool is reused for the engine's
    /// lifetime. A failed open is reported to every waiter and may be
    /// retried by a later operation.
    async fn pool(&self) -> StorageResult<&SqlitePool> {
        self.pool.get_or_try_init(|| self.open()).await
    }

    /// Connect, create the record table if it is missing, and stamp the
    /// schema version.
    async fn open(&self) -> StorageResult<SqlitePool> {
        let options = SqliteConnectOptions::new()
            .filename(&self.db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(DATABASE_POOL_CONNECTIONS_MAX)
            .connect_with(options)
            .await
            .map_err(|e| {
                init_err(
                    &format!("failed to open database {}", self.db_path.display()),
                    e,
                )
            })?;

        let current: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&pool)
            .await
            .map_err(|e| init_err("failed to read store version", e))?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            self.store_name
        ))
        .execute(&pool)
        .await
        .map_err(|e| init_err(&format!("failed to create store {}", self.store_name), e))?;

        if current < i64::from(self.version) {
            sqlx::query(&format!("PRAGMA user_version = {}", self.version))
                .execute(&pool)
                .await
                .map_err(|e| init_err("failed to stamp store version", e))?;
        }

        Ok(pool)
    }
}

#[async_trait]
impl AsyncStorage for DatabaseEngine {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| backend_err("failed to open read transaction", e))?;

        let value: Option<String> = sqlx::query_scalar(&format!(
            "SELECT value FROM {} WHERE key = ?1",
            self.store_name
        ))
        .bind(key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| backend_err(&format!("failed to read {key:?}"), e))?;

        tx.commit()
            .await
            .map_err(|e| backend_err("failed to commit read transaction", e))?;

        Ok(value)
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| backend_err("failed to open write transaction", e))?;

        sqlx::query(&format!(
            "INSERT INTO {} (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            self.store_name
        ))
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await
        .map_err(|e| backend_err(&format!("failed to write {key:?}"), e))?;

        // Resolve only after the commit: a resolved future means durable.
        tx.commit()
            .await
            .map_err(|e| backend_err("failed to commit write transaction", e))?;

        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| backend_err("failed to open write transaction", e))?;

        sqlx::query(&format!("DELETE FROM {} WHERE key = ?1", self.store_name))
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend_err(&format!("failed to remove {key:?}"), e))?;

        tx.commit()
            .await
            .map_err(|e| backend_err("failed to commit write transaction", e))?;

        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        let pool = self.pool().await?;
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| backend_err("failed to open write transaction", e))?;

        sqlx::query(&format!("DELETE FROM {}", self.store_name))
            .execute(&mut *tx)
            .await
            .map_err(|e| backend_err("failed to clear store", e))?;

        tx.commit()
            .await
            .map_err(|e| backend_err("failed to commit write transaction", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_engine(dir: &Path) -> DatabaseEngine {
        DatabaseEngine::new(DatabaseEngineConfig {
            db_path: Some(dir.join("test.db")),
            ..DatabaseEngineConfig::default()
        })
    }

    #[tokio::test]
    async fn test_crud() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(dir.path());

        assert_eq!(engine.get_item("k").await.unwrap(), None);

        engine.set_item("k", "v").await.unwrap();
        assert_eq!(engine.get_item("k").await.unwrap(), Some("v".to_string()));

        engine.set_item("k", "v2").await.unwrap();
        assert_eq!(engine.get_item("k").await.unwrap(), Some("v2".to_string()));

        engine.remove_item("k").await.unwrap();
        assert_eq!(engine.get_item("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(dir.path());

        engine.remove_item("never-written").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(dir.path());

        engine.set_item("a", "1").await.unwrap();
        engine.set_item("b", "2").await.unwrap();
        engine.clear().await.unwrap();

        assert_eq!(engine.get_item("a").await.unwrap(), None);
        assert_eq!(engine.get_item("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let engine = scratch_engine(dir.path());
            engine.set_item("k", "v").await.unwrap();
        }

        let reopened = scratch_engine(dir.path());
        assert_eq!(reopened.get_item("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_version_is_stamped_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DatabaseEngine::new(DatabaseEngineConfig {
            db_path: Some(dir.path().join("test.db")),
            version: Some(3),
            ..DatabaseEngineConfig::default()
        });

        engine.set_item("k", "v").await.unwrap();

        let pool = engine.pool().await.unwrap();
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(pool)
            .await
            .unwrap();
        assert_eq!(version, 3);
    }

    #[tokio::test]
    async fn test_custom_store_name() {
        let dir = tempfile::tempdir().unwrap();
        let engine = DatabaseEngine::new(DatabaseEngineConfig {
            db_path: Some(dir.path().join("test.db")),
            store_name: Some("custom_records".to_string()),
            ..DatabaseEngineConfig::default()
        });

        engine.set_item("k", "v").await.unwrap();
        assert_eq!(engine.get_item("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_clones_share_one_open() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(dir.path());
        let clone = engine.clone();

        engine.set_item("k", "v").await.unwrap();

        // The clone reads through the same memoized pool.
        assert_eq!(clone.get_item("k").await.unwrap(), Some("v".to_string()));
        assert!(std::ptr::eq(
            engine.pool().await.unwrap(),
            clone.pool().await.unwrap()
        ));
    }

    #[tokio::test]
    async fn test_concurrent_first_operations_share_the_open() {
        let dir = tempfile::tempdir().unwrap();
        let engine = scratch_engine(dir.path());

        // Issue operations immediately, before any explicit open.
        let (a, b, c) = tokio::join!(
            engine.set_item("a", "1"),
            engine.set_item("b", "2"),
            engine.set_item("c", "3"),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(engine.get_item("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(engine.get_item("b").await.unwrap(), Some("2".to_string()));
        assert_eq!(engine.get_item("c").await.unwrap(), Some("3".to_string()));
    }

    #[test]
    #[should_panic(expected = "plain identifier")]
    fn test_hostile_store_name_panics() {
        let _ = DatabaseEngine::new(DatabaseEngineConfig {
            store_name: Some("records; DROP TABLE users".to_string()),
            ..DatabaseEngineConfig::default()
        });
    }
}
