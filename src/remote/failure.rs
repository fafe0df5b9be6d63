//! Failure reporting side channel
//!
//! Upstream failures never reach callers of the resource service; they are
//! reported here instead so they stay visible to whoever watches the logs.

use crate::error::FetchError;

use super::{RequestParams, ResourceKind};

/// One exhausted upstream fetch.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub kind: ResourceKind,
    pub params: RequestParams,
    pub cause: FetchError,
}

/// Receives failure events from the resource service.
pub trait FailureSink: Send + Sync {
    fn record(&self, failure: &FetchFailure);
}

/// Writes each failure as an `error` log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFailureSink;

impl FailureSink for LogFailureSink {
    fn record(&self, failure: &FetchFailure) {
        log::error!(
            target: "mangarelay::upstream",
            "upstream fetch failed kind={} params=[{}] cause={}",
            failure.kind,
            failure.params,
            failure.cause
        );
    }
}

/// Keeps failures in memory for inspection.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingFailureSink {
    events: std::sync::Mutex<Vec<FetchFailure>>,
}

#[cfg(test)]
impl RecordingFailureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FetchFailure> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl FailureSink for RecordingFailureSink {
    fn record(&self, failure: &FetchFailure) {
        if let Ok(mut events) = self.events.lock() {
            events.push(failure.clone());
        }
    }
}
