//! Error types for the engine layer.
//!
//! Structured errors for source parsing and every transport, carrying enough
//! context (URL, path, tool) to make failures actionable without re-running.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a download engine or one of its transports.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL the transfer was talking to.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while staging or placing artifacts.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A version-control tool invocation failed or could not be spawned.
    #[error("{tool} failed for {url}: {detail}")]
    Tool {
        /// The tool that failed (`git` or `hg`).
        tool: String,
        /// The source being fetched when the tool failed.
        url: String,
        /// Captured stderr or spawn failure detail.
        detail: String,
    },

    /// The source names a transport this engine has no client for.
    #[error("unsupported transport `{transport}` in source {url}")]
    UnsupportedTransport {
        /// The full source URL.
        url: String,
        /// The transport prefix or scheme that is not supported.
        transport: String,
    },

    /// The source string cannot be interpreted as any known form.
    #[error("malformed source {url}: {reason}")]
    MalformedSource {
        /// The offending source string.
        url: String,
        /// Why it could not be parsed.
        reason: String,
    },

    /// The remote registry violated the expected protocol shape.
    #[error("registry protocol error for {url}: {detail}")]
    Protocol {
        /// The registry URL being spoken to.
        url: String,
        /// What the registry sent that could not be handled.
        detail: String,
    },
}

impl EngineError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a tool-failure error.
    pub fn tool(
        tool: impl Into<String>,
        url: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool: tool.into(),
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Creates an unsupported-transport error.
    pub fn unsupported_transport(url: impl Into<String>, transport: impl Into<String>) -> Self {
        Self::UnsupportedTransport {
            url: url.into(),
            transport: transport.into(),
        }
    }

    /// Creates a malformed-source error.
    pub fn malformed_source(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a registry-protocol error.
    pub fn protocol(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Protocol {
            url: url.into(),
            detail: detail.into(),
        }
    }
}
