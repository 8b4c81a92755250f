//! Durable key-value cache for synced collections.
//!
//! Every named entry (products collection, inventory map, static-data
//! snapshot, sync timestamps) is stored as one JSON document in a DuckDB
//! table. A write replaces the whole entry; there is no field-level update.

use crate::clock::{Clock, SystemClock};
use crate::config;
use crate::error::{Result, SyncError};
use duckdb::Connection as DuckDbConnection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sync_cache (\
                        key VARCHAR PRIMARY KEY, \
                        value VARCHAR NOT NULL, \
                        updated_at BIGINT NOT NULL\
                      )";

/// Durable store shared by all sync routines.
///
/// Survives process restarts when opened on a directory. Readers never see a
/// half-written entry: each write is a single `INSERT OR REPLACE`, and
/// multi-entry writes run in one transaction.
pub struct PersistentCache {
    conn: Mutex<DuckDbConnection>,
    path: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl PersistentCache {
    /// Open (or create) the cache database inside `cache_dir`.
    ///
    /// Creates the directory if it does not exist.
    pub fn open<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let dir = cache_dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(config::CACHE_DB_FILE);
        let conn = DuckDbConnection::open(&path)?;
        tracing::debug!(path = %path.display(), "opened sync cache");
        Self::init(conn, Some(path))
    }

    /// A cache that lives only as long as this value. Intended for tests.
    pub fn in_memory() -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Self::init(conn, None)
    }

    fn init(conn: DuckDbConnection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            clock: Arc::new(SystemClock),
        })
    }

    /// Stamp `updated_at` from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, DuckDbConnection>> {
        self.conn
            .lock()
            .map_err(|_| SyncError::CacheUnavailable("connection lock poisoned".into()))
    }

    /// Database file backing this cache, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the raw JSON text stored under `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT value FROM sync_cache WHERE key = ?")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Load and deserialize the entry under `key`.
    ///
    /// An entry that no longer parses (schema drift, manual edits) is removed
    /// and reported as absent, so the next sync repopulates it.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt cache entry -- removing");
                self.remove(key)?;
                Ok(None)
            }
        }
    }

    /// Serialize `value` and replace the entry under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO sync_cache (key, value, updated_at) VALUES (?, ?, ?)",
            duckdb::params![key, json, self.clock.now_ms()],
        )?;
        Ok(())
    }

    /// Replace several entries in one transaction.
    ///
    /// Used where a collection and its sync timestamp must move together.
    pub fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = self.clock.now_ms();
        for (key, json) in entries {
            tx.execute(
                "INSERT OR REPLACE INTO sync_cache (key, value, updated_at) VALUES (?, ?, ?)",
                duckdb::params![*key, json.as_str(), now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove the entry under `key`. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM sync_cache WHERE key = ?", [key])?;
        Ok(removed > 0)
    }

    /// Epoch milliseconds of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT updated_at FROM sync_cache WHERE key = ?")?;
        let mut rows = stmt.query([key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_raw(key)?.is_some())
    }

    /// Read an epoch-millisecond timestamp entry.
    pub fn get_timestamp(&self, key: &str) -> Result<Option<i64>> {
        self.get::<i64>(key)
    }

    pub fn set_timestamp(&self, key: &str, ms: i64) -> Result<()> {
        self.set(key, &ms)
    }

    /// All keys currently stored, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM sync_cache ORDER BY key")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM sync_cache")?;
        Ok(())
    }
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache")
            .field("path", &self.path)
            .finish()
    }
}
