//! Shared fixtures for integration tests.
#![allow(dead_code)]

pub mod socket_guard;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bundlefetch_core::{DownloadEngine, EngineConcurrency, EngineError, Metadata, Transport};
use tokio::sync::Barrier;

/// What a [`RecordingEngine`] returns from `fetch`.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// `Ok(None)`, like the stock default engine.
    NoMetadata,
    /// `Ok(Some(..))` with the carried metadata.
    Metadata(Metadata),
    /// `Err(..)` with the carried detail text.
    Fail(String),
}

/// Test engine that records every invocation and tracks overlap.
pub struct RecordingEngine {
    name: &'static str,
    concurrency: EngineConcurrency,
    outcome: StubOutcome,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<(String, PathBuf)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingEngine {
    pub fn new(name: &'static str, concurrency: EngineConcurrency) -> Self {
        Self {
            name,
            concurrency,
            outcome: StubOutcome::NoMetadata,
            delay: None,
            barrier: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_outcome(mut self, outcome: StubOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Holds each invocation open for `delay` so overlap is observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Parks each invocation on `barrier`; the test only completes if enough
    /// invocations are in flight at once to release it.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn calls(&self) -> Vec<(String, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadEngine for RecordingEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn concurrency(&self) -> EngineConcurrency {
        self.concurrency
    }

    async fn fetch(
        &self,
        source_url: &str,
        dest_dir: &Path,
    ) -> Result<Option<Metadata>, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((source_url.to_string(), dest_dir.to_path_buf()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.outcome.clone() {
            StubOutcome::NoMetadata => Ok(None),
            StubOutcome::Metadata(metadata) => Ok(Some(metadata)),
            StubOutcome::Fail(detail) => Err(EngineError::tool("stub", source_url, detail)),
        }
    }
}

/// Metadata fixture with every field populated.
pub fn sample_metadata() -> Metadata {
    Metadata {
        transport: Transport::Git,
        artifact: Some(PathBuf::from("policy.rego")),
        revision: Some("0123456789abcdef0123456789abcdef01234567".to_string()),
        bytes: Some(64),
    }
}
