//! Download dispatch: security classification, engine selection, execution.
//!
//! The dispatcher is the front door for every download. Each request runs
//! through the same path: classify the source URL, pick an engine, execute
//! it under the concurrency discipline the engine declares.
//!
//! # Architecture
//!
//! - [`Dispatcher`] - Facade tying classification, selection and execution
//!   together
//! - [`DispatchConfig`] - Construction-time configuration (alternate-engine
//!   switch)
//! - [`DispatchContext`] - Per-request context carrying an optional engine
//!   override
//! - [`EngineRegistry`] - Engine pair with fixed selection precedence
//! - [`ExecutionLock`] - Shared handle to the exclusive-engine mutex
//!
//! # Example
//!
//! ```no_run
//! use bundlefetch_core::dispatch::{DispatchConfig, DispatchContext, Dispatcher};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(DispatchConfig::from_env());
//! let ctx = DispatchContext::new();
//! dispatcher
//!     .download(
//!         &ctx,
//!         Path::new("./bundles"),
//!         "git::https://example.com/org/policy.git",
//!         false,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod executor;
mod security;
mod selection;

pub use error::DispatchError;
pub use executor::ExecutionLock;
pub use security::{TransportClass, classify, is_secure};
pub use selection::EngineRegistry;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::engine::{BasicEngine, DownloadEngine, GatherEngine, Metadata};

use executor::SerialExecutor;

/// Environment variable routing every download through the alternate engine.
pub const GATHER_ENGINE_ENV: &str = "BUNDLEFETCH_GATHER";

/// Configuration fixed when a dispatcher is constructed.
///
/// The alternate-engine switch is read once, at construction; flipping the
/// environment afterwards does not affect a live dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchConfig {
    /// Route every download through the alternate engine, regardless of
    /// per-request overrides.
    pub use_alternate_engine: bool,
}

impl DispatchConfig {
    /// Reads configuration from the process environment.
    ///
    /// `BUNDLEFETCH_GATHER=1|true|yes` (case-insensitive) enables the
    /// alternate engine.
    #[must_use]
    pub fn from_env() -> Self {
        let use_alternate_engine = std::env::var(GATHER_ENGINE_ENV)
            .ok()
            .is_some_and(|value| env_flag_enabled(&value));
        Self {
            use_alternate_engine,
        }
    }
}

fn env_flag_enabled(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Per-request context for a download.
#[derive(Default)]
pub struct DispatchContext {
    engine_override: Option<Arc<dyn DownloadEngine>>,
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field(
                "engine_override",
                &self.engine_override.as_ref().map(|e| e.name()),
            )
            .finish()
    }
}

impl DispatchContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context with `engine` installed as the override.
    ///
    /// The override loses to the global alternate-engine switch; see
    /// [`EngineRegistry`] for the full precedence.
    #[must_use]
    pub fn with_engine_override(mut self, engine: Arc<dyn DownloadEngine>) -> Self {
        self.engine_override = Some(engine);
        self
    }

    /// The override engine, when one is installed.
    #[must_use]
    pub fn engine_override(&self) -> Option<&Arc<dyn DownloadEngine>> {
        self.engine_override.as_ref()
    }
}

/// Front door for downloads.
///
/// Owns the engine registry and the executor. Cheap to share behind an `Arc`;
/// all methods take `&self`.
#[derive(Debug)]
pub struct Dispatcher {
    registry: EngineRegistry,
    executor: SerialExecutor,
}

impl Dispatcher {
    /// Creates a dispatcher with the stock engine pair and a fresh lock.
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self::with_engines(
            config,
            Arc::new(BasicEngine::new()),
            Arc::new(GatherEngine::new()),
            ExecutionLock::new(),
        )
    }

    /// Creates a dispatcher over explicit engines and an explicit lock.
    ///
    /// This is the seam for substituting engines and for serializing
    /// exclusive engines across several dispatchers via a shared lock.
    #[must_use]
    pub fn with_engines(
        config: DispatchConfig,
        default_engine: Arc<dyn DownloadEngine>,
        alternate_engine: Arc<dyn DownloadEngine>,
        lock: ExecutionLock,
    ) -> Self {
        Self {
            registry: EngineRegistry::new(
                default_engine,
                alternate_engine,
                config.use_alternate_engine,
            ),
            executor: SerialExecutor::new(lock),
        }
    }

    /// Downloads `source_url` into `dest_dir`.
    ///
    /// Insecure sources (plain HTTP, wrapped or not) are rejected before an
    /// engine is selected, so they never reach the network. When
    /// `show_progress` is set, a `Downloading <source> to <dest>` notice is
    /// printed to stdout.
    ///
    /// Returns the engine's transfer metadata when it reports any.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InsecureSource`] for plain-HTTP sources;
    /// engine failures pass through as [`DispatchError::Engine`].
    #[instrument(level = "debug", skip(self, ctx, dest_dir), fields(dest = %dest_dir.display()))]
    pub async fn download(
        &self,
        ctx: &DispatchContext,
        dest_dir: &Path,
        source_url: &str,
        show_progress: bool,
    ) -> Result<Option<Metadata>, DispatchError> {
        if !is_secure(source_url) {
            return Err(DispatchError::insecure_source(source_url));
        }

        debug!(url = %source_url, dest = %dest_dir.display(), "downloading");
        if show_progress {
            println!("Downloading {source_url} to {}", dest_dir.display());
        }

        let engine = self.registry.select(ctx.engine_override());
        let result = self
            .executor
            .execute(engine.as_ref(), source_url, dest_dir)
            .await;
        if let Err(e) = &result {
            debug!(engine = engine.name(), error = %e, "download failed");
        }
        Ok(result?)
    }
}
