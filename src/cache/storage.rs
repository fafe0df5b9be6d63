//! SQLite-based cache storage
//!
//! Persists normalized responses between process runs. Expired rows are
//! removed when read and counted separately in [`CacheStats`].

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::{CacheEntry, CacheKey, CacheStore, Result};
use crate::error::CacheError;
use crate::remote::{Normalized, ResourceKind};

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed cache storage
pub struct SqliteCache {
    conn: Mutex<Connection>,
    dir: PathBuf,
}

impl SqliteCache {
    /// Get the default cache directory (~/.cache/mangarelay on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("mangarelay"))
    }

    /// Open cache storage at a specific directory
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path)?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                kind TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                expires_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_expires_at ON cache_entries(expires_at);
            CREATE INDEX IF NOT EXISTS idx_kind ON cache_entries(kind);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            dir: cache_dir.to_path_buf(),
        })
    }

    /// Directory holding the database
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.conn()?;
        let entries_removed = conn.execute("DELETE FROM cache_entries", [])?;
        Ok(ClearStats { entries_removed })
    }

    /// Delete every entry of one resource kind
    pub fn delete_by_kind(&self, kind: ResourceKind) -> Result<ClearStats> {
        let conn = self.conn()?;
        let entries_removed =
            conn.execute("DELETE FROM cache_entries WHERE kind = ?1", [kind.as_str()])?;
        Ok(ClearStats { entries_removed })
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp_millis();

        let total_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        let valid_entries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE expires_at > ?1",
            [now],
            |r| r.get(0),
        )?;

        let total_size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM cache_entries",
            [],
            |r| r.get(0),
        )?;

        let (oldest, newest): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(created_at), MAX(created_at) FROM cache_entries WHERE expires_at > ?1",
            [now],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        let mut stmt = conn.prepare(
            "SELECT kind, COUNT(*) FROM cache_entries WHERE expires_at > ?1
             GROUP BY kind ORDER BY kind",
        )?;
        let by_kind = stmt
            .query_map([now], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)? as usize)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(CacheStats {
            total_entries: total_entries as usize,
            valid_entries: valid_entries as usize,
            expired_entries: (total_entries - valid_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_entry: oldest.and_then(DateTime::from_timestamp_millis),
            newest_entry: newest.and_then(DateTime::from_timestamp_millis),
            valid_by_kind: by_kind,
        })
    }

    /// Nuke the cache database
    fn nuke(db_path: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        Ok(())
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp_millis();

        let row: Option<(String, i64, i64)> = conn
            .query_row(
                "SELECT data, created_at, expires_at FROM cache_entries WHERE cache_key = ?1",
                [key.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((data, created_at, expires_at)) = row else {
            return Ok(None);
        };

        if expires_at <= now {
            conn.execute(
                "DELETE FROM cache_entries WHERE cache_key = ?1",
                [key.as_str()],
            )?;
            return Ok(None);
        }

        match serde_json::from_str::<Normalized>(&data) {
            Ok(value) => Ok(Some(CacheEntry {
                value,
                inserted_at: DateTime::from_timestamp_millis(created_at).unwrap_or_else(Utc::now),
                ttl: Duration::from_millis((expires_at - created_at).max(0) as u64),
            })),
            Err(e) => {
                log::warn!("Dropping undecodable cache entry {}: {}", key.as_str(), e);
                // Delete stale entry
                let _ = conn.execute(
                    "DELETE FROM cache_entries WHERE cache_key = ?1",
                    [key.as_str()],
                );
                Ok(None)
            }
        }
    }

    fn put(&self, key: &CacheKey, value: &Normalized, ttl: Duration) -> Result<()> {
        let data = serde_json::to_string(value).map_err(|e| CacheError::Encoding(e.to_string()))?;
        let now = Utc::now().timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl_ms);

        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries
             (cache_key, kind, data, created_at, expires_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                key.as_str(),
                key.kind().as_str(),
                data,
                now,
                expires,
                data.len() as i64
            ],
        )?;
        Ok(())
    }
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    /// Valid entry counts keyed by resource kind name
    pub valid_by_kind: Vec<(String, usize)>,
}
