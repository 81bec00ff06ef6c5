//! Object-store transport for S3 and GCS sources.
//!
//! Objects are fetched over the store's plain HTTPS endpoint, so presigned or
//! public URLs work without any cloud SDK. Scheme-less locations (the
//! `bucket.s3.amazonaws.com/key` shorthand) default to HTTPS.

use std::path::Path;

use reqwest::Client;
use url::Url;

use super::http;
use crate::engine::Metadata;
use crate::engine::error::EngineError;
use crate::engine::source::Transport;

/// Fetches one object from an S3 or GCS endpoint into `into_dir`.
pub(super) async fn fetch(
    client: &Client,
    transport: Transport,
    location: &str,
    into_dir: &Path,
) -> Result<Metadata, EngineError> {
    let url = if location.contains("://") {
        location.to_string()
    } else {
        format!("https://{location}")
    };

    let parsed =
        Url::parse(&url).map_err(|e| EngineError::malformed_source(location, e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EngineError::malformed_source(
            location,
            format!(
                "unexpected scheme `{}` for object-store transport",
                parsed.scheme()
            ),
        ));
    }

    let filename = http::object_filename(&parsed);
    let (artifact, bytes) = http::fetch_object(client, &url, into_dir, &filename).await?;

    Ok(Metadata {
        transport,
        artifact: Some(artifact),
        revision: None,
        bytes: Some(bytes),
    })
}
