//! Download engines: pluggable backends that materialize sources on disk.
//!
//! An engine takes a source URL and a destination directory and produces the
//! downloaded content, routing each source through the matching transport
//! (HTTP, local file, git/hg checkout, S3/GCS object, OCI artifact).
//!
//! # Architecture
//!
//! - [`DownloadEngine`] - Async trait every engine implements
//! - [`BasicEngine`] - Default engine staging transfers in a shared scratch
//!   directory
//! - [`GatherEngine`] - Metadata-reporting engine with per-call staging
//! - [`SourceSpec`] - Parsed source (transport + location)
//! - [`Metadata`] - What a completed transfer produced
//!
//! # Example
//!
//! ```no_run
//! use bundlefetch_core::engine::{DownloadEngine, GatherEngine};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GatherEngine::new();
//! let metadata = engine
//!     .fetch("https://example.com/policy.tar.gz", Path::new("./bundles"))
//!     .await?;
//! println!("Fetched: {metadata:?}");
//! # Ok(())
//! # }
//! ```

mod basic;
mod error;
mod gather;
mod source;
mod transport;

pub use basic::BasicEngine;
pub use error::EngineError;
pub use gather::GatherEngine;
pub use source::{SourceSpec, Transport};
pub use transport::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

/// How an engine's invocations may interleave within the process.
///
/// Engines declare this themselves so the executor only serializes the ones
/// that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineConcurrency {
    /// Invocations share mutable state and must run one at a time.
    Exclusive,
    /// Invocations are independent and may overlap freely.
    Concurrent,
}

/// Description of what a completed transfer placed in the destination.
///
/// Engines that do not track transfer details return `None` from
/// [`DownloadEngine::fetch`] instead of fabricating one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Transport that served the source.
    pub transport: Transport,
    /// Path of the primary artifact, relative to the destination directory.
    /// `None` when the transfer produced a whole tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Upstream revision identifier (commit hash, manifest digest) when the
    /// transport exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Total object bytes transferred, when counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Trait that all download engines implement.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn DownloadEngine>`. Rust 2024 native async traits are not
/// object-safe, so `async_trait` is required for engine selection.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Returns the engine's name (e.g., "basic", "gather").
    fn name(&self) -> &str;

    /// Returns how invocations of this engine may interleave.
    fn concurrency(&self) -> EngineConcurrency;

    /// Fetches `source_url` into `dest_dir`, creating the directory if
    /// needed.
    ///
    /// Returns transfer metadata when the engine tracks it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the source cannot be parsed or the
    /// transfer fails.
    async fn fetch(
        &self,
        source_url: &str,
        dest_dir: &Path,
    ) -> Result<Option<Metadata>, EngineError>;
}
