use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::sqlite;
use super::StorageError;

/// Key/value store of JSON documents, shared by every dashboard.
pub struct LocalStore {
    conn: Mutex<Connection>,
}

impl LocalStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_database(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(sqlite::open_memory_database()?),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    /// Keys starting with `prefix`, sorted.
    pub fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }

    /// Typed read. A value that fails to parse is an error.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Malformed {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set_raw(key, &raw)
    }

    /// Typed read that never fails: missing, malformed or unreadable
    /// values yield `fallback()`.
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, fallback: impl FnOnce() -> T) -> T {
        match self.get_json(key) {
            Ok(Some(value)) => value,
            Ok(None) => fallback(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Local store value ignored, using default");
                fallback()
            }
        }
    }

    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_or(key, T::default)
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        page_size: u32,
        compact: bool,
    }

    #[test]
    fn json_round_trip() {
        let store = LocalStore::open_in_memory().unwrap();
        let settings = Settings {
            page_size: 25,
            compact: true,
        };
        store.set_json("settings.admin", &settings).unwrap();
        let loaded: Option<Settings> = store.get_json("settings.admin").unwrap();
        assert_eq!(loaded, Some(settings));
    }

    #[test]
    fn set_overwrites_existing_key() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_raw("token", "a").unwrap();
        store.set_raw("token", "b").unwrap();
        assert_eq!(store.get_raw("token").unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn malformed_json_is_error_for_strict_read() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_raw("settings.lab", "{\"page_size\": \"lots\"}").unwrap();
        let result: Result<Option<Settings>, _> = store.get_json("settings.lab");
        assert!(matches!(result, Err(StorageError::Malformed { .. })));
    }

    #[test]
    fn malformed_json_falls_back_to_default() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_raw("settings.lab", "not json at all").unwrap();
        let settings: Settings = store.load_or_default("settings.lab");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_key_uses_fallback() {
        let store = LocalStore::open_in_memory().unwrap();
        let value: Vec<u32> = store.load_or("nothing", || vec![1, 2]);
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn remove_and_keys() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_raw("settings.b", "1").unwrap();
        store.set_raw("settings.a", "2").unwrap();
        store.set_raw("session.token", "t").unwrap();
        assert_eq!(store.keys("settings.").unwrap(), vec!["settings.a", "settings.b"]);
        assert!(store.remove("settings.a").unwrap());
        assert!(!store.remove("settings.a").unwrap());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        {
            let store = LocalStore::open(&path).unwrap();
            store.set_json("pharmacy.inventory", &vec!["a", "b"]).unwrap();
        }
        let store = LocalStore::open(&path).unwrap();
        let items: Vec<String> = store.load_or_default("pharmacy.inventory");
        assert_eq!(items, vec!["a", "b"]);
    }
}
