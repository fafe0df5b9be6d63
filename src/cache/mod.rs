//! Response cache
//!
//! Normalized upstream responses are cached under a digest of the resource
//! kind and its canonical params. Two stores are provided: an in-process
//! map and an SQLite file that survives between CLI runs.

pub mod key;
pub mod memory;
pub mod storage;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CacheError;
use crate::remote::{Normalized, ResourceKind};

// Re-export main types
pub use key::CacheKey;
pub use memory::MemoryCache;
pub use storage::SqliteCache;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Default TTLs per resource kind
pub struct CacheTtl;

impl CacheTtl {
    // Listings move as new chapters land
    pub const LIST: Duration = Duration::from_secs(60); // 1 min
    pub const LATEST: Duration = Duration::from_secs(2 * 60); // 2 min
    pub const SEARCH: Duration = Duration::from_secs(2 * 60); // 2 min
    pub const CATALOG: Duration = Duration::from_secs(5 * 60); // 5 min
    pub const GENRE_PAGE: Duration = Duration::from_secs(5 * 60); // 5 min
    pub const POPULAR: Duration = Duration::from_secs(10 * 60); // 10 min

    // The genre taxonomy is near static
    pub const GENRES: Duration = Duration::from_secs(60 * 60); // 1 hr

    // Title pages pick up new chapters; chapter pages do not change once published
    pub const ITEM: Duration = Duration::from_secs(5 * 60); // 5 min
    pub const DETAIL: Duration = Duration::from_secs(5 * 60); // 5 min
    pub const CHAPTER: Duration = Duration::from_secs(10 * 60); // 10 min
    pub const READ_CHAPTER: Duration = Duration::from_secs(10 * 60); // 10 min
}

/// TTL per resource kind, with optional overrides from config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TtlPolicy {
    overrides: HashMap<ResourceKind, Duration>,
}

impl TtlPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in TTL for a kind.
    pub fn default_for(kind: ResourceKind) -> Duration {
        match kind {
            ResourceKind::List => CacheTtl::LIST,
            ResourceKind::Item => CacheTtl::ITEM,
            ResourceKind::Chapter => CacheTtl::CHAPTER,
            ResourceKind::Detail => CacheTtl::DETAIL,
            ResourceKind::ReadChapter => CacheTtl::READ_CHAPTER,
            ResourceKind::Genres => CacheTtl::GENRES,
            ResourceKind::GenrePage => CacheTtl::GENRE_PAGE,
            ResourceKind::Search => CacheTtl::SEARCH,
            ResourceKind::Catalog => CacheTtl::CATALOG,
            ResourceKind::Popular => CacheTtl::POPULAR,
            ResourceKind::Latest => CacheTtl::LATEST,
        }
    }

    /// Override the TTL for one kind.
    pub fn with(mut self, kind: ResourceKind, ttl: Duration) -> Self {
        self.overrides.insert(kind, ttl);
        self
    }

    pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
        self.overrides
            .get(&kind)
            .copied()
            .unwrap_or_else(|| Self::default_for(kind))
    }
}

/// A cached normalized response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub value: Normalized,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(value: Normalized, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Utc::now(),
            ttl,
        }
    }

    /// `None` when the TTL is too large to represent, i.e. never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::from_std(self.ttl)
            .ok()
            .and_then(|ttl| self.inserted_at.checked_add_signed(ttl))
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_none_or(|expires| now < expires)
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

/// Key-value store for normalized responses.
///
/// Implementations must tolerate concurrent readers and writers. A `put`
/// replaces whatever was stored under the key.
pub trait CacheStore: Send + Sync {
    /// Fresh entry for `key`, or `None` when absent or expired.
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;

    /// Store `value` under `key` for `ttl`.
    fn put(&self, key: &CacheKey, value: &Normalized, ttl: Duration) -> Result<()>;
}
