//! Metadata-reporting engine with per-call staging.

use std::path::Path;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::fs;
use tracing::debug;

use super::source::SourceSpec;
use super::transport::{Transports, move_contents};
use super::{DownloadEngine, EngineConcurrency, EngineError, Metadata};

/// Alternate engine that reports what each transfer produced.
///
/// Every invocation stages in its own temporary directory, removed when the
/// call ends on any path. Invocations share nothing, so the engine declares
/// itself [`EngineConcurrency::Concurrent`].
#[derive(Debug, Default)]
pub struct GatherEngine {
    transports: Transports,
}

impl GatherEngine {
    /// Creates the engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transports: Transports::new(),
        }
    }
}

#[async_trait]
impl DownloadEngine for GatherEngine {
    fn name(&self) -> &str {
        "gather"
    }

    fn concurrency(&self) -> EngineConcurrency {
        EngineConcurrency::Concurrent
    }

    async fn fetch(
        &self,
        source_url: &str,
        dest_dir: &Path,
    ) -> Result<Option<Metadata>, EngineError> {
        let spec = SourceSpec::parse(source_url)?;
        debug!(url = %source_url, transport = %spec.transport, "fetching through gather engine");

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| EngineError::io(dest_dir, e))?;
        let staging = TempDir::new().map_err(|e| EngineError::io(std::env::temp_dir(), e))?;

        let metadata = self.transports.fetch_spec(&spec, staging.path()).await?;
        move_contents(staging.path(), dest_dir).await?;

        // Artifact paths are relative, so they stay valid after the move.
        Ok(Some(metadata))
    }
}
