//! Cache key generation using SHA-256 hashes

use sha2::{Digest, Sha256};

use crate::remote::{RequestParams, ResourceKind};

/// Deterministic fingerprint of a resource request.
///
/// The digest covers the kind, an optional scope (the upstream base URL)
/// and the params in canonical order. Every component is length-prefixed,
/// so values containing separators cannot make two requests collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: ResourceKind,
    digest: String,
}

impl CacheKey {
    #[cfg(test)]
    pub fn new(kind: ResourceKind, params: &RequestParams) -> Self {
        Self::scoped(kind, None, params)
    }

    pub fn scoped(kind: ResourceKind, scope: Option<&str>, params: &RequestParams) -> Self {
        let mut hasher = Sha256::new();

        update_field(&mut hasher, kind.as_str());

        // Unscoped and empty-scoped keys must differ
        match scope {
            Some(scope) => {
                hasher.update([1u8]);
                update_field(&mut hasher, scope);
            }
            None => hasher.update([0u8]),
        }

        for (k, v) in params.iter() {
            update_field(&mut hasher, k);
            update_field(&mut hasher, v);
        }

        Self {
            kind,
            digest: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Hex-encoded digest.
    pub fn as_str(&self) -> &str {
        &self.digest
    }
}

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = CacheKey::new(
            ResourceKind::Search,
            &RequestParams::from_pairs([("q", "solo"), ("page", "1")]),
        );
        let key2 = CacheKey::new(
            ResourceKind::Search,
            &RequestParams::from_pairs([("page", "1"), ("q", "solo")]),
        );

        // Same inputs in different order should produce same key
        assert_eq!(key1, key2);
        assert_eq!(key1.as_str().len(), 64);
    }

    #[test]
    fn test_cache_key_different_kinds() {
        let params = RequestParams::new().with("page", 1);
        let key1 = CacheKey::new(ResourceKind::List, &params);
        let key2 = CacheKey::new(ResourceKind::Catalog, &params);

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_different_values() {
        let key1 = CacheKey::new(ResourceKind::List, &RequestParams::new().with("page", 1));
        let key2 = CacheKey::new(ResourceKind::List, &RequestParams::new().with("page", 2));

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_separator_in_value() {
        let key1 = CacheKey::new(
            ResourceKind::Search,
            &RequestParams::new().with("q", "a&page=2"),
        );
        let key2 = CacheKey::new(
            ResourceKind::Search,
            &RequestParams::new().with("q", "a").with("page", 2),
        );

        assert_ne!(key1, key2);
    }

    #[test]
    fn test_cache_key_scopes() {
        let params = RequestParams::new().with("id", "m1");
        let unscoped = CacheKey::new(ResourceKind::Item, &params);
        let empty = CacheKey::scoped(ResourceKind::Item, Some(""), &params);
        let a = CacheKey::scoped(ResourceKind::Item, Some("https://a.example"), &params);
        let b = CacheKey::scoped(ResourceKind::Item, Some("https://b.example"), &params);

        assert_ne!(unscoped, empty);
        assert_ne!(a, b);
        assert_eq!(
            a,
            CacheKey::scoped(ResourceKind::Item, Some("https://a.example"), &params)
        );
    }

    #[test]
    fn test_cache_key_remembers_kind() {
        let key = CacheKey::new(ResourceKind::Chapter, &RequestParams::new());
        assert_eq!(key.kind(), ResourceKind::Chapter);
    }
}
