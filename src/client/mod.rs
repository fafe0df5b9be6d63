//! Upstream content API client

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::remote::RequestParams;

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod rate_limit;

pub use http::{HttpClientConfig, HttpFetchClient};
#[cfg(test)]
pub use mock::MockUpstream;

/// Raw access to the upstream API.
///
/// `path_template` is relative to the client's base URL; `{name}` segments
/// are filled from `params` and the remaining params become the query
/// string. Implementations own their retry policy and report only the final
/// outcome.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    async fn fetch(&self, path_template: &str, params: &RequestParams)
    -> Result<Value, FetchError>;

    /// Identifies the upstream in cache keys, if it has a stable identity.
    fn scope(&self) -> Option<&str> {
        None
    }
}
