//! Mock upstream API for testing
//!
//! Scripts responses per path template without making real requests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::UpstreamApi;
use crate::error::FetchError;
use crate::remote::RequestParams;

type Scripted = Result<Value, FetchError>;

/// Mock upstream client.
///
/// Each path template has a queue of one-shot responses and an optional
/// fallback used once the queue is drained. Templates with neither answer
/// `{"data": []}`.
///
/// # Example
/// ```ignore
/// let mock = MockUpstream::new()
///     .with_response("api/v1/manga", json!({"data": [{"id": "m1"}]}))
///     .await;
///
/// let value = mock.fetch("api/v1/manga", &RequestParams::new()).await?;
/// ```
#[derive(Default)]
pub struct MockUpstream {
    /// One-shot responses, consumed in order
    queued: Arc<Mutex<HashMap<String, VecDeque<Scripted>>>>,
    /// Responses repeated after the queue is empty
    fallback: Arc<Mutex<HashMap<String, Scripted>>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Artificial latency per call
    delay: Option<Duration>,
    scope: Option<String>,
}

/// A captured upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    pub path_template: String,
    pub params: RequestParams,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `template` with `value`.
    pub async fn with_response(self, template: &str, value: Value) -> Self {
        self.fallback
            .lock()
            .await
            .insert(template.to_string(), Ok(value));
        self
    }

    /// Always fail `template` with `error`.
    pub async fn with_error(self, template: &str, error: FetchError) -> Self {
        self.fallback
            .lock()
            .await
            .insert(template.to_string(), Err(error));
        self
    }

    /// Queue a one-shot outcome for `template`.
    pub async fn then(self, template: &str, outcome: Scripted) -> Self {
        self.queued
            .lock()
            .await
            .entry(template.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.to_string());
        self
    }

    /// Get all captured requests for test assertions.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Number of fetches made against `template`.
    pub async fn call_count(&self, template: &str) -> usize {
        self.captured_requests
            .lock()
            .await
            .iter()
            .filter(|r| r.path_template == template)
            .count()
    }

    /// Number of fetches made across all templates.
    pub async fn total_calls(&self) -> usize {
        self.captured_requests.lock().await.len()
    }
}

#[async_trait]
impl UpstreamApi for MockUpstream {
    async fn fetch(
        &self,
        path_template: &str,
        params: &RequestParams,
    ) -> Result<Value, FetchError> {
        self.captured_requests.lock().await.push(CapturedRequest {
            path_template: path_template.to_string(),
            params: params.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self
            .queued
            .lock()
            .await
            .get_mut(path_template)
            .and_then(|queue| queue.pop_front())
        {
            return outcome;
        }

        match self.fallback.lock().await.get(path_template) {
            Some(outcome) => outcome.clone(),
            None => Ok(json!({ "data": [] })),
        }
    }

    fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_empty() {
        let mock = MockUpstream::new();

        let value = mock.fetch("genre-all", &RequestParams::new()).await.unwrap();
        assert_eq!(value, json!({ "data": [] }));
        assert_eq!(mock.call_count("genre-all").await, 1);
    }

    #[tokio::test]
    async fn test_mock_queue_before_fallback() {
        let mock = MockUpstream::new()
            .with_response("terbaru-2", json!([1]))
            .await
            .then("terbaru-2", Err(FetchError::Transport("reset".into())))
            .await;

        let params = RequestParams::new();
        assert!(mock.fetch("terbaru-2", &params).await.is_err());
        assert_eq!(mock.fetch("terbaru-2", &params).await.unwrap(), json!([1]));
        assert_eq!(mock.fetch("terbaru-2", &params).await.unwrap(), json!([1]));
        assert_eq!(mock.total_calls().await, 3);
    }

    #[tokio::test]
    async fn test_mock_captures_params() {
        let mock = MockUpstream::new();
        let params = RequestParams::new().with("id", "m1");

        mock.fetch("api/v1/manga/{id}", &params).await.unwrap();

        let captured = mock.captured_requests().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].path_template, "api/v1/manga/{id}");
        assert_eq!(captured[0].params.get("id"), Some("m1"));
    }
}
