//! SQLite-backed preference store.

use crate::error::{PrefsError, PrefsResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Persistent store for namespaced string preferences.
///
/// Cloning is cheap; clones share one connection.
#[derive(Clone)]
pub struct PreferenceStore {
    conn: Arc<Mutex<Connection>>,
}

impl PreferenceStore {
    /// Opens (or creates) a preference store at the given path.
    pub fn new(path: impl AsRef<Path>) -> PrefsResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PrefsError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| PrefsError::Storage(format!("failed to open preference store: {e}")))?;
        debug!("Opened preference store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory preference store (for testing).
    pub fn open_in_memory() -> PrefsResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PrefsError::Storage(format!("failed to open in-memory preference store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> PrefsResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> PrefsResult<()> {
        self.lock()?
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS preferences (
                    namespace TEXT NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    UNIQUE(namespace, key)
                );
                ",
            )
            .map_err(|e| PrefsError::Storage(format!("failed to init preference schema: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> PrefsResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| PrefsError::Poisoned)
    }

    /// Returns a handle scoped to one namespace.
    pub fn namespace(&self, name: impl Into<String>) -> Preferences {
        Preferences {
            store: self.clone(),
            namespace: name.into(),
        }
    }

    fn get(&self, namespace: &str, key: &str) -> PrefsResult<Option<String>> {
        self.lock()?
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| PrefsError::Storage(format!("failed to read preference {key}: {e}")))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> PrefsResult<()> {
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO preferences (namespace, key, value) VALUES (?1, ?2, ?3)",
                params![namespace, key, value],
            )
            .map_err(|e| PrefsError::Storage(format!("failed to write preference {key}: {e}")))?;
        Ok(())
    }

    fn remove(&self, namespace: &str, key: &str) -> PrefsResult<bool> {
        let removed = self
            .lock()?
            .execute(
                "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
            )
            .map_err(|e| PrefsError::Storage(format!("failed to remove preference {key}: {e}")))?;
        Ok(removed > 0)
    }
}

/// Preferences within a single namespace.
#[derive(Clone)]
pub struct Preferences {
    store: PreferenceStore,
    namespace: String,
}

impl Preferences {
    /// Reads a string value.
    pub fn get_string(&self, key: &str) -> PrefsResult<Option<String>> {
        self.store.get(&self.namespace, key)
    }

    /// Writes a string value, replacing any previous one.
    pub fn put_string(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.store.put(&self.namespace, key, value)
    }

    /// Reads a JSON-encoded value.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> PrefsResult<Option<T>> {
        match self.get_string(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes a JSON-encoded value.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> PrefsResult<()> {
        let raw = serde_json::to_string(value)?;
        self.put_string(key, &raw)
    }

    /// Removes a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> PrefsResult<bool> {
        self.store.remove(&self.namespace, key)
    }
}
