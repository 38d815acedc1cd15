//! libSQL-backed preference storage.
//!
//! SiteKit persists exactly two per-device values: the explicit dark-mode
//! choice and the loopback tenant override used in local development. Both go
//! through the [`PreferenceStore`] trait so the theme engine and the domain
//! resolver can run against [`Storage`] in production and [`MemoryStore`] in
//! tests or one-shot invocations.

mod migrations;

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Database, params};
use sitekit_shared::{Result, SiteKitError};
use tokio::sync::Mutex;

/// Preference key for the persisted dark-mode choice (`"true"` / `"false"`).
pub const DARK_MODE_KEY: &str = "dark_mode";

/// Preference key for the tenant domain impersonated on loopback hosts.
pub const DEV_DOMAIN_KEY: &str = "dev_domain";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Key/value store for per-device preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read a value, `None` if never set.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// Storage (libSQL)
// ---------------------------------------------------------------------------

/// Primary storage handle wrapping a local libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SiteKitError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SiteKitError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// List all stored preferences as `(key, value)`, ordered by key.
    pub async fn list(&self) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query("SELECT key, value FROM preferences ORDER BY key", params![])
            .await
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push((
                row.get::<String>(0)
                    .map_err(|e| SiteKitError::Storage(e.to_string()))?,
                row.get::<String>(1)
                    .map_err(|e| SiteKitError::Storage(e.to_string()))?,
            ));
        }
        Ok(results)
    }
}

impl PreferenceStore for Storage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM preferences WHERE key = ?1", params![key])
            .await
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<String>(0)
                    .map_err(|e| SiteKitError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(SiteKitError::Storage(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now.as_str()],
            )
            .await
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;
        tracing::debug!(key, "preference stored");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM preferences WHERE key = ?1", params![key])
            .await
            .map_err(|e| SiteKitError::Storage(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Non-persistent store for tests and invocations without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage(dir: &tempfile::TempDir) -> Storage {
        Storage::open(&dir.path().join("prefs.db"))
            .await
            .expect("open storage")
    }

    #[tokio::test]
    async fn open_applies_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir).await;
        assert_eq!(storage.get_schema_version().await, 1);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir).await;
        storage.set(DARK_MODE_KEY, "true").await.unwrap();
        drop(storage);

        let storage = test_storage(&dir).await;
        assert_eq!(storage.get_schema_version().await, 1);
        assert_eq!(
            storage.get(DARK_MODE_KEY).await.unwrap().as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn set_overwrites_and_remove_clears() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&dir).await;

        assert!(storage.get(DEV_DOMAIN_KEY).await.unwrap().is_none());

        storage.set(DEV_DOMAIN_KEY, "verify.uans.us").await.unwrap();
        storage.set(DEV_DOMAIN_KEY, "mint.uans.us").await.unwrap();
        assert_eq!(
            storage.get(DEV_DOMAIN_KEY).await.unwrap().as_deref(),
            Some("mint.uans.us")
        );

        let all = storage.list().await.unwrap();
        assert_eq!(all, vec![(DEV_DOMAIN_KEY.to_string(), "mint.uans.us".to_string())]);

        storage.remove(DEV_DOMAIN_KEY).await.unwrap();
        storage.remove(DEV_DOMAIN_KEY).await.unwrap();
        assert!(storage.get(DEV_DOMAIN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        store.set(DARK_MODE_KEY, "false").await.unwrap();
        assert_eq!(store.get(DARK_MODE_KEY).await.unwrap().as_deref(), Some("false"));
        store.remove(DARK_MODE_KEY).await.unwrap();
        assert!(store.get(DARK_MODE_KEY).await.unwrap().is_none());
    }
}
