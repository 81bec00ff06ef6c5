//! Plain HTTP(S) object transport with streaming writes.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use crate::engine::Metadata;
use crate::engine::error::EngineError;
use crate::engine::source::Transport;

/// Fetches a single object over HTTP(S) into `into_dir`.
pub(super) async fn fetch(
    client: &Client,
    location: &str,
    into_dir: &Path,
) -> Result<Metadata, EngineError> {
    let parsed =
        Url::parse(location).map_err(|e| EngineError::malformed_source(location, e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EngineError::malformed_source(
            location,
            format!("unexpected scheme `{}` for http transport", parsed.scheme()),
        ));
    }

    let filename = object_filename(&parsed);
    let (artifact, bytes) = fetch_object(client, location, into_dir, &filename).await?;
    Ok(Metadata {
        transport: Transport::Http,
        artifact: Some(artifact),
        revision: None,
        bytes: Some(bytes),
    })
}

/// Fetches `url` into `into_dir/filename`, returning the relative artifact
/// path and the body size.
///
/// Shared by the object-store and OCI transports, which pick their own
/// filenames. A partial file is removed when the stream fails midway.
pub(super) async fn fetch_object(
    client: &Client,
    url: &str,
    into_dir: &Path,
    filename: &str,
) -> Result<(PathBuf, u64), EngineError> {
    debug!(url = %url, filename = %filename, "fetching object");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| EngineError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::http_status(url, status.as_u16()));
    }

    let path = into_dir.join(filename);
    let stream_result = stream_to_file(response, url, &path).await;
    if stream_result.is_err() {
        debug!(path = %path.display(), "cleaning up partial file after error");
        let _ = tokio::fs::remove_file(&path).await;
    }
    let bytes = stream_result?;

    Ok((PathBuf::from(filename), bytes))
}

/// Streams a response body to `path`, returning bytes written.
pub(super) async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    path: &Path,
) -> Result<u64, EngineError> {
    let file = File::create(path)
        .await
        .map_err(|e| EngineError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| EngineError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| EngineError::io(path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| EngineError::io(path, e))?;
    Ok(bytes_written)
}

/// Derives an output filename from the last non-empty URL path segment.
pub(super) fn object_filename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back());
    match segment {
        Some(name) => name.to_string(),
        None => "artifact".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn parsed(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_object_filename_last_segment() {
        assert_eq!(
            object_filename(&parsed("https://example.com/bundles/policy.tar.gz")),
            "policy.tar.gz"
        );
    }

    #[test]
    fn test_object_filename_ignores_trailing_slash() {
        assert_eq!(
            object_filename(&parsed("https://example.com/bundles/")),
            "bundles"
        );
    }

    #[test]
    fn test_object_filename_fallback_for_bare_host() {
        assert_eq!(object_filename(&parsed("https://example.com/")), "artifact");
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let temp_dir = TempDir::new().unwrap();
        let client = Client::new();

        let result = fetch(&client, "ftp://example.com/file", temp_dir.path()).await;
        assert!(matches!(result, Err(EngineError::MalformedSource { .. })));
    }

    #[tokio::test]
    async fn test_fetch_streams_body_and_reports_bytes() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/data/config.json"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{\"allow\":true}"))
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let url = format!("{}/data/config.json", mock_server.uri());

        let metadata = fetch(&client, &url, temp_dir.path()).await.unwrap();

        assert_eq!(metadata.transport, Transport::Http);
        assert_eq!(metadata.artifact, Some(PathBuf::from("config.json")));
        assert_eq!(metadata.bytes, Some(14));
        let contents = std::fs::read(temp_dir.path().join("config.json")).unwrap();
        assert_eq!(contents, b"{\"allow\":true}");
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = Client::new();
        let url = format!("{}/missing", mock_server.uri());

        let result = fetch(&client, &url, temp_dir.path()).await;
        match result {
            Err(EngineError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_cleans_up_partial_file_on_stream_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"data")
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(1))
            .build()
            .unwrap();
        let url = format!("{}/slow", mock_server.uri());

        let result = fetch(&client, &url, temp_dir.path()).await;
        assert!(result.is_err(), "expected timeout or network error");

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert!(
            entries.is_empty(),
            "Partial file must be cleaned up after stream error, found: {entries:?}"
        );
    }
}
