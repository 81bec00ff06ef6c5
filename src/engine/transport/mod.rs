//! Transport implementations backing the download engines.
//!
//! Each transport materializes one kind of source into a local directory:
//! plain HTTP(S) objects, local files, git/hg checkouts, S3/GCS objects over
//! their HTTPS endpoints, and OCI registry artifacts. Engines own a
//! [`Transports`] value and route parsed sources through it.

use std::path::Path;
use std::time::Duration;

use reqwest::Client;

use super::Metadata;
use super::error::EngineError;
use super::source::{SourceSpec, Transport};
use crate::user_agent;

mod file;
mod http;
mod object;
mod oci;
mod vcs;

pub(crate) use file::move_contents;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large objects).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// The transport set shared by an engine.
///
/// Holds a single reqwest client reused by every HTTP-backed transport so
/// transfers to the same host share pooled connections.
#[derive(Debug, Clone)]
pub(crate) struct Transports {
    client: Client,
}

impl Default for Transports {
    fn default() -> Self {
        Self::new()
    }
}

impl Transports {
    /// Creates the transport set with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub(crate) fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(user_agent::default_fetch_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Materializes `spec` into `into_dir` and reports what was transferred.
    ///
    /// `into_dir` must already exist. Artifact paths in the returned metadata
    /// are relative to `into_dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying transport's [`EngineError`].
    pub(crate) async fn fetch_spec(
        &self,
        spec: &SourceSpec,
        into_dir: &Path,
    ) -> Result<Metadata, EngineError> {
        match spec.transport {
            Transport::File => file::fetch(&spec.location, into_dir).await,
            Transport::Git | Transport::Hg => {
                vcs::fetch(spec.transport, &spec.location, into_dir).await
            }
            Transport::S3 | Transport::Gcs => {
                object::fetch(&self.client, spec.transport, &spec.location, into_dir).await
            }
            Transport::Oci => oci::fetch(&self.client, &spec.location, into_dir).await,
            Transport::Http => http::fetch(&self.client, &spec.location, into_dir).await,
        }
    }
}
