//! In-process cache store

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;

use super::{CacheEntry, CacheKey, CacheStore, Result};
use crate::error::CacheError;
use crate::remote::Normalized;

/// Map-backed store with lazy expiry.
///
/// Expired entries are dropped when read. With a capacity set, inserting
/// into a full store first purges expired entries and then evicts the
/// oldest insertion.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: Option<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: Some(max_entries.max(1)),
        }
    }
}

#[cfg(test)]
impl MemoryCache {
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        Ok(drop_expired(&mut entries))
    }
}

fn drop_expired(entries: &mut HashMap<String, CacheEntry>) -> usize {
    let before = entries.len();
    let now = Utc::now();
    entries.retain(|_, entry| entry.is_fresh_at(now));
    before - entries.len()
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        {
            let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
            match entries.get(key.as_str()) {
                None => return Ok(None),
                Some(entry) if entry.is_fresh() => return Ok(Some(entry.clone())),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer refreshed it in between
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        if let Some(entry) = entries.get(key.as_str()) {
            if entry.is_fresh() {
                return Ok(Some(entry.clone()));
            }
            entries.remove(key.as_str());
        }
        Ok(None)
    }

    fn put(&self, key: &CacheKey, value: &Normalized, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;

        if let Some(max) = self.max_entries
            && entries.len() >= max
            && !entries.contains_key(key.as_str())
        {
            drop_expired(&mut entries);

            if entries.len() >= max {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key.as_str().to_string(),
            CacheEntry::new(value.clone(), ttl),
        );
        Ok(())
    }
}
