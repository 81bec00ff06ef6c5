//! Source detection: mapping a raw source URL to a transport and location.
//!
//! Sources may force a transport with a `prefix::` wrapper (`git::`, `hg::`,
//! `s3::`, `gcs::`, `oci::`), use a plain `http(s)://` or `file://` URL, or be
//! a bare filesystem path. Detection is pure string work; validating that the
//! location is actually reachable is the transport's job.

use std::fmt;

use serde::Serialize;

use super::error::EngineError;

/// The transfer mechanism a source resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Local filesystem copy.
    File,
    /// Git checkout via the system `git` binary.
    Git,
    /// Mercurial checkout via the system `hg` binary.
    Hg,
    /// S3 object fetched over its HTTPS endpoint.
    S3,
    /// GCS object fetched over its HTTPS endpoint.
    Gcs,
    /// OCI registry artifact pull.
    Oci,
    /// Plain HTTP(S) object fetch.
    Http,
}

impl Transport {
    /// Returns the canonical lowercase name used in prefixes and metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Git => "git",
            Self::Hg => "hg",
            Self::S3 => "s3",
            Self::Gcs => "gcs",
            Self::Oci => "oci",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed source: which transport serves it and the unwrapped location.
///
/// `location` is the string handed to the transport: the inner URL for wrapped
/// forms (`git::https://…` → `https://…`), the path for file sources, the
/// `registry/repository:tag` reference for OCI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Transport selected for this source.
    pub transport: Transport,
    /// Unwrapped location the transport operates on.
    pub location: String,
}

/// Well-known code-hosting hosts detected as git sources when given bare.
const GIT_HOSTS: [&str; 3] = ["github.com/", "gitlab.com/", "bitbucket.org/"];

impl SourceSpec {
    /// Parses a raw source string into a transport and location.
    ///
    /// Detection order:
    /// 1. forced `prefix::` wrapper (unknown alphanumeric prefixes are
    ///    rejected rather than guessed at);
    /// 2. `file://` URLs and explicit `http(s)://` URLs, with URLs ending in
    ///    `.git` routed to the git transport;
    /// 3. bare `github.com/…`-style repository shorthand;
    /// 4. bare object-store hosts (`bucket.s3.amazonaws.com/…`,
    ///    `www.googleapis.com/storage/…`);
    /// 5. anything else is a local filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedSource`] for empty sources or an empty
    /// wrapper prefix, and [`EngineError::UnsupportedTransport`] for a forced
    /// prefix no transport claims.
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        if raw.is_empty() {
            return Err(EngineError::malformed_source(raw, "empty source"));
        }

        if raw.starts_with("::") {
            return Err(EngineError::malformed_source(
                raw,
                "missing transport prefix before `::`",
            ));
        }

        match raw.split_once("::") {
            Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_alphanumeric()) => {
                let transport = match prefix {
                    "git" => Transport::Git,
                    "hg" => Transport::Hg,
                    "s3" => Transport::S3,
                    "gcs" => Transport::Gcs,
                    "oci" => Transport::Oci,
                    "http" | "https" => Transport::Http,
                    "file" => Transport::File,
                    other => return Err(EngineError::unsupported_transport(raw, other)),
                };
                return Ok(Self {
                    transport,
                    location: rest.to_string(),
                });
            }
            _ => {}
        }

        if let Some(path) = raw.strip_prefix("file://") {
            return Ok(Self {
                transport: Transport::File,
                location: path.to_string(),
            });
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let transport = if raw.ends_with(".git") {
                Transport::Git
            } else {
                Transport::Http
            };
            return Ok(Self {
                transport,
                location: raw.to_string(),
            });
        }

        if GIT_HOSTS.iter().any(|host| raw.starts_with(host)) {
            return Ok(Self {
                transport: Transport::Git,
                location: format!("https://{raw}"),
            });
        }

        if let Some((host, _)) = raw.split_once('/') {
            if host.ends_with(".amazonaws.com") {
                return Ok(Self {
                    transport: Transport::S3,
                    location: format!("https://{raw}"),
                });
            }
            if host == "www.googleapis.com" {
                return Ok(Self {
                    transport: Transport::Gcs,
                    location: format!("https://{raw}"),
                });
            }
        }

        Ok(Self {
            transport: Transport::File,
            location: raw.to_string(),
        })
    }
}
