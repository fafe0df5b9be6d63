//! Cached, fail-open access to upstream resources
//!
//! Every call resolves to a normalized value. Upstream failures are reported
//! to the failure sink and replaced by the kind's empty default; they are
//! never cached, so the next call tries the upstream again.

use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use super::normalize::title_page;
use super::{
    FailureSink, FetchFailure, LogFailureSink, Normalized, RequestParams, ResourceKind, normalize,
};
use crate::cache::{CacheKey, CacheStore, TtlPolicy};
use crate::client::UpstreamApi;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A fresh cache entry
    Cache,
    /// A successful upstream fetch, now cached
    Upstream,
    /// The kind's empty default after a failed fetch
    Fallback,
}

/// A normalized value together with its kind and origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub kind: ResourceKind,
    pub origin: Origin,
    pub value: Normalized,
}

impl Resolved {
    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Fallback
    }
}

/// Landing page data, fetched concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeFeed {
    pub popular: Resolved,
    pub genres: Resolved,
    pub latest: Resolved,
}

impl HomeFeed {
    pub fn sections(&self) -> [(&'static str, &Resolved); 3] {
        [
            ("popular", &self.popular),
            ("genres", &self.genres),
            ("latest", &self.latest),
        ]
    }
}

/// Resource service over any [`UpstreamApi`].
///
/// The cache is optional (`--no-cache`); without one every call goes
/// upstream.
pub struct RemoteResourceService<A: UpstreamApi> {
    api: Arc<A>,
    cache: Option<Arc<dyn CacheStore>>,
    ttl: TtlPolicy,
    failures: Arc<dyn FailureSink>,
}

impl<A: UpstreamApi> RemoteResourceService<A> {
    /// Create a service with default TTLs that logs failures.
    pub fn new(api: A, cache: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            api: Arc::new(api),
            cache,
            ttl: TtlPolicy::default(),
            failures: Arc::new(LogFailureSink),
        }
    }

    pub fn with_ttl_policy(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    #[cfg(test)]
    pub fn with_failure_sink(mut self, sink: Arc<dyn FailureSink>) -> Self {
        self.failures = sink;
        self
    }

    /// Get the inner client
    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_some()
    }

    /// Resolve `kind` with `params` through the cache.
    ///
    /// Never fails: on upstream failure the kind's empty value is returned
    /// with [`Origin::Fallback`] and one [`FetchFailure`] is recorded.
    pub async fn resolve(&self, kind: ResourceKind, params: RequestParams) -> Resolved {
        let key = CacheKey::scoped(kind, self.api.scope(), &params);

        if let Some(cached) = self.get_cached(&key) {
            debug!("Cache hit: {} [{}]", kind, params);
            return Resolved {
                kind,
                origin: Origin::Cache,
                value: cached,
            };
        }
        debug!("Cache miss: {} [{}]", kind, params);

        match self.api.fetch(kind.path_template(), &params).await {
            Ok(raw) => {
                let value = normalize(kind, raw);
                self.set_cached(&key, &value);
                Resolved {
                    kind,
                    origin: Origin::Upstream,
                    value,
                }
            }
            Err(cause) => {
                self.failures.record(&FetchFailure {
                    kind,
                    params,
                    cause,
                });
                Resolved {
                    kind,
                    origin: Origin::Fallback,
                    value: Normalized::empty(kind),
                }
            }
        }
    }

    fn get_cached(&self, key: &CacheKey) -> Option<Normalized> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(entry) => entry.map(|e| e.value),
            Err(e) => {
                warn!("Cache read failed for {}: {}", key.kind(), e);
                None
            }
        }
    }

    fn set_cached(&self, key: &CacheKey, value: &Normalized) {
        if let Some(ref cache) = self.cache
            && let Err(e) = cache.put(key, value, self.ttl.ttl_for(key.kind()))
        {
            warn!("Cache write failed for {}: {}", key.kind(), e);
        }
    }

    /// One page of the catalog listing.
    pub async fn list(&self, page: u32) -> Resolved {
        self.resolve(ResourceKind::List, RequestParams::new().with("page", page))
            .await
    }

    /// A single title.
    pub async fn get(&self, id: &str) -> Resolved {
        self.resolve(ResourceKind::Item, RequestParams::new().with("id", id))
            .await
    }

    /// Pages of one chapter.
    pub async fn get_chapter(&self, chapter_id: &str) -> Resolved {
        self.resolve(
            ResourceKind::Chapter,
            RequestParams::new().with("chapter_id", chapter_id),
        )
        .await
    }

    /// A title's detail page.
    pub async fn detail(&self, slug: &str) -> Resolved {
        self.resolve(ResourceKind::Detail, RequestParams::new().with("slug", slug))
            .await
    }

    /// The reader page of one chapter of a title.
    pub async fn read_chapter(&self, slug: &str, chapter: &str) -> Resolved {
        self.resolve(
            ResourceKind::ReadChapter,
            RequestParams::new().with("slug", slug).with("chapter", chapter),
        )
        .await
    }

    pub async fn genres(&self) -> Resolved {
        self.resolve(ResourceKind::Genres, RequestParams::new()).await
    }

    /// One page of a genre. Untitled pages are titled after the slug.
    pub async fn genre(&self, slug: &str, page: u32) -> Resolved {
        let mut resolved = self
            .resolve(
                ResourceKind::GenrePage,
                RequestParams::new().with("slug", slug).with("page", page),
            )
            .await;
        title_page(&mut resolved.value, slug);
        resolved
    }

    pub async fn search(&self, query: &str, page: u32) -> Resolved {
        self.resolve(
            ResourceKind::Search,
            RequestParams::new().with("q", query.trim()).with("page", page),
        )
        .await
    }

    pub async fn catalog(&self, page: u32) -> Resolved {
        self.resolve(ResourceKind::Catalog, RequestParams::new().with("page", page))
            .await
    }

    pub async fn popular(&self) -> Resolved {
        self.resolve(ResourceKind::Popular, RequestParams::new()).await
    }

    pub async fn latest(&self) -> Resolved {
        self.resolve(ResourceKind::Latest, RequestParams::new()).await
    }

    /// Popular, genres and latest in one round trip.
    pub async fn home(&self) -> HomeFeed {
        let (popular, genres, latest) =
            futures::join!(self.popular(), self.genres(), self.latest());

        HomeFeed {
            popular,
            genres,
            latest,
        }
    }
}
