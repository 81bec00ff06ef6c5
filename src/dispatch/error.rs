//! Error types for the dispatch layer.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors returned when dispatching a download.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The source transfers over plain HTTP and was rejected before any
    /// engine ran.
    #[error("attempting to download from insecure source: {url}")]
    InsecureSource {
        /// The rejected source URL.
        url: String,
    },

    /// The selected engine failed. The engine's error passes through
    /// unchanged so callers see the original failure.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl DispatchError {
    /// Creates an insecure-source rejection.
    pub fn insecure_source(url: impl Into<String>) -> Self {
        Self::InsecureSource { url: url.into() }
    }
}
