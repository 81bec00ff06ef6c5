//! Bundlefetch Core Library
//!
//! This library provides the core functionality for the bundlefetch tool,
//! which fetches policy bundles and configuration sources from file, git,
//! mercurial, object-storage, OCI and HTTPS origins into a local directory.
//!
//! Every download runs through the same secure dispatch path: the source URL
//! is classified first and plain-HTTP sources are refused before any engine
//! is selected, and engines that are not safe for concurrent invocation are
//! serialized behind a shared lock.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`dispatch`] - Security classification, engine selection, serialized
//!   execution
//! - [`engine`] - Download engines and the transport layer beneath them

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dispatch;
pub mod engine;

pub(crate) mod user_agent;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use dispatch::{
    DispatchConfig, DispatchContext, DispatchError, Dispatcher, ExecutionLock, GATHER_ENGINE_ENV,
    TransportClass, classify, is_secure,
};
pub use engine::{
    BasicEngine, DownloadEngine, EngineConcurrency, EngineError, GatherEngine, Metadata,
    SourceSpec, Transport,
};
