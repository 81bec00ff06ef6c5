//! Serialized execution for engines that cannot overlap.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::engine::{DownloadEngine, EngineConcurrency, EngineError, Metadata};

/// Handle to the mutex serializing exclusive-engine invocations.
///
/// Clones share the same underlying lock. Dispatchers constructed
/// independently get independent locks; to serialize across dispatchers,
/// build them from the same handle.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLock {
    inner: Arc<Mutex<()>>,
}

impl ExecutionLock {
    /// Creates a fresh, unshared lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Runs engine invocations, holding the lock around the ones that demand it.
#[derive(Debug)]
pub(crate) struct SerialExecutor {
    lock: ExecutionLock,
}

impl SerialExecutor {
    pub(crate) fn new(lock: ExecutionLock) -> Self {
        Self { lock }
    }

    /// Invokes `engine` for one download.
    ///
    /// For [`EngineConcurrency::Exclusive`] engines the lock is held across
    /// the whole invocation and released on every exit path, errors and
    /// cancellation included. Concurrent engines run unlocked.
    pub(crate) async fn execute(
        &self,
        engine: &dyn DownloadEngine,
        source_url: &str,
        dest_dir: &Path,
    ) -> Result<Option<Metadata>, EngineError> {
        match engine.concurrency() {
            EngineConcurrency::Exclusive => {
                debug!(engine = engine.name(), "waiting for engine lock");
                let _guard = self.lock.inner.lock().await;
                debug!(engine = engine.name(), "engine lock acquired");
                engine.fetch(source_url, dest_dir).await
            }
            EngineConcurrency::Concurrent => engine.fetch(source_url, dest_dir).await,
        }
    }
}
