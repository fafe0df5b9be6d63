//! HTTP implementation of the upstream API client

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::ACCEPT;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde_json::Value;

use super::UpstreamApi;
use super::rate_limit::{DEFAULT_RATE_PER_SECOND, ReactiveRateLimiter};
use crate::error::FetchError;
use crate::remote::RequestParams;

/// Longest upstream error body kept in a [`FetchError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// Retry and timeout policy for upstream requests
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Hard limit for one attempt, body included
    pub timeout: Duration,
    /// Attempts after the first one
    pub retries: u32,
    /// Fixed pause between attempts
    pub backoff: Duration,
    /// Request rate once the upstream has answered 429
    pub rate_limit_per_second: u32,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 2,
            backoff: Duration::from_millis(100),
            rate_limit_per_second: DEFAULT_RATE_PER_SECOND,
        }
    }
}

impl HttpClientConfig {
    /// Total attempts per fetch
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Upstream client doing plain GETs with bounded retries.
pub struct HttpFetchClient {
    http: HttpClient,
    base_url: Url,
    config: HttpClientConfig,
    rate_limiter: ReactiveRateLimiter,
}

impl HttpFetchClient {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, config: HttpClientConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("bad base URL '{}': {}", base_url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidRequest(format!(
                "base URL must be http(s): {}",
                base_url
            )));
        }

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(concat!("mangarelay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::from)?;

        let rate_limiter = ReactiveRateLimiter::new(config.rate_limit_per_second);

        Ok(Self {
            http,
            base_url,
            config,
            rate_limiter,
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fill path placeholders and append the leftover params as query.
    pub fn build_url(&self, path_template: &str, params: &RequestParams) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        let mut used = Vec::new();
        let mut segments = Vec::new();

        for segment in path_template.split('/').filter(|s| !s.is_empty()) {
            match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = params.get(name).filter(|v| !v.is_empty()).ok_or_else(|| {
                        FetchError::InvalidRequest(format!("missing path parameter '{}'", name))
                    })?;
                    used.push(name);
                    segments.push(value);
                }
                None => segments.push(segment),
            }
        }

        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidRequest(format!("cannot extend URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);

        let query: Vec<(&str, &str)> = params.iter().filter(|(k, _)| !used.contains(k)).collect();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// One GET, no retries.
    async fn attempt(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            self.rate_limiter.activate();
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        serde_json::from_slice(&bytes).map_err(|e| FetchError::InvalidBody(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::from(err)
        }
    }
}

#[async_trait]
impl UpstreamApi for HttpFetchClient {
    async fn fetch(
        &self,
        path_template: &str,
        params: &RequestParams,
    ) -> Result<Value, FetchError> {
        let url = self.build_url(path_template, params)?;
        let attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            self.rate_limiter.wait_if_active().await;

            match self.attempt(&url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    debug!(
                        "GET {} attempt {}/{} failed: {}",
                        url, attempt, attempts, err
                    );
                    tokio::time::sleep(self.config.backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    debug!("GET {} gave up after {} attempt(s): {}", url, attempt, err);
                    return Err(err);
                }
            }
        }
    }

    fn scope(&self) -> Option<&str> {
        Some(self.base_url.as_str())
    }
}
