//! Default download engine with a fixed staging directory per instance.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::source::SourceSpec;
use super::transport::{Transports, move_contents};
use super::{DownloadEngine, EngineConcurrency, EngineError, Metadata};

/// Distinguishes the staging roots of engines created in the same process.
static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// The default engine.
///
/// Every invocation stages its transfer in the engine's fixed scratch
/// directory (cleared on entry) before moving results into the destination,
/// so a failed transfer never leaves partial content where the caller looks.
/// Reusing one scratch directory means invocations of the same engine must
/// not overlap; the engine declares itself
/// [`EngineConcurrency::Exclusive`] and relies on the executor to serialize
/// calls.
#[derive(Debug)]
pub struct BasicEngine {
    transports: Transports,
    staging_root: PathBuf,
}

impl BasicEngine {
    /// Creates the engine with its own scratch directory under the system
    /// temp dir, named by process id and instance number so engines never
    /// share staging.
    #[must_use]
    pub fn new() -> Self {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let staging_root =
            std::env::temp_dir().join(format!("bundlefetch-stage-{}-{seq}", std::process::id()));
        Self {
            transports: Transports::new(),
            staging_root,
        }
    }

    /// Creates the engine staging under `staging_root` instead of a derived
    /// scratch directory.
    #[must_use]
    pub fn with_staging_root(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            transports: Transports::new(),
            staging_root: staging_root.into(),
        }
    }

    /// Clears and recreates the scratch directory.
    async fn reset_staging(&self) -> Result<(), EngineError> {
        match fs::remove_dir_all(&self.staging_root).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(EngineError::io(&self.staging_root, e)),
        }
        fs::create_dir_all(&self.staging_root)
            .await
            .map_err(|e| EngineError::io(&self.staging_root, e))
    }
}

impl Default for BasicEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadEngine for BasicEngine {
    fn name(&self) -> &str {
        "basic"
    }

    fn concurrency(&self) -> EngineConcurrency {
        EngineConcurrency::Exclusive
    }

    async fn fetch(
        &self,
        source_url: &str,
        dest_dir: &Path,
    ) -> Result<Option<Metadata>, EngineError> {
        let spec = SourceSpec::parse(source_url)?;
        debug!(url = %source_url, transport = %spec.transport, "fetching through basic engine");

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| EngineError::io(dest_dir, e))?;
        self.reset_staging().await?;

        let fetched = self.transports.fetch_spec(&spec, &self.staging_root).await;
        let moved = match fetched {
            // Transfer details are not reported by this engine.
            Ok(_) => move_contents(&self.staging_root, dest_dir).await,
            Err(e) => Err(e),
        };

        let _ = fs::remove_dir_all(&self.staging_root).await;
        moved.map(|()| None)
    }
}
