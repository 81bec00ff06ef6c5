//! OCI registry transport speaking the distribution API directly.
//!
//! Pulls an artifact by resolving its manifest (`/v2/<repo>/manifests/<ref>`)
//! and downloading every layer blob. Anonymous pulls that answer 401 with a
//! `WWW-Authenticate: Bearer` challenge go through one token round trip and a
//! single retry. Layer digests are reported as received; content verification
//! is the registry's contract, not performed here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reqwest::header::{ACCEPT, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::http;
use crate::engine::Metadata;
use crate::engine::error::EngineError;
use crate::engine::source::Transport;

/// Media types accepted when resolving a manifest.
const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
    application/vnd.docker.distribution.manifest.v2+json";

/// Annotation carrying the original filename of a layer.
const LAYER_TITLE_ANNOTATION: &str = "org.opencontainers.image.title";

#[derive(Debug, PartialEq, Eq)]
struct Reference {
    scheme: &'static str,
    registry: String,
    repository: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    layers: Vec<Layer>,
}

#[derive(Debug, Deserialize)]
struct Layer {
    digest: String,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
struct BearerChallenge {
    realm: String,
    service: Option<String>,
    scope: Option<String>,
}

/// Pulls the artifact behind `location` into `into_dir`.
pub(super) async fn fetch(
    client: &Client,
    location: &str,
    into_dir: &Path,
) -> Result<Metadata, EngineError> {
    let reference = parse_reference(location)?;
    let manifest_url = format!(
        "{}://{}/v2/{}/manifests/{}",
        reference.scheme, reference.registry, reference.repository, reference.reference
    );

    let mut token: Option<String> = None;
    let mut response = manifest_request(client, &manifest_url, None)
        .send()
        .await
        .map_err(|e| EngineError::network(&manifest_url, e))?;

    if response.status() == StatusCode::UNAUTHORIZED {
        token = request_token(client, &response, &manifest_url).await?;
        if token.is_some() {
            response = manifest_request(client, &manifest_url, token.as_deref())
                .send()
                .await
                .map_err(|e| EngineError::network(&manifest_url, e))?;
        }
    }

    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::http_status(&manifest_url, status.as_u16()));
    }

    let revision = response
        .headers()
        .get("Docker-Content-Digest")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string);

    let manifest: Manifest = response
        .json()
        .await
        .map_err(|e| EngineError::protocol(&manifest_url, format!("invalid manifest: {e}")))?;
    if manifest.layers.is_empty() {
        return Err(EngineError::protocol(&manifest_url, "manifest has no layers"));
    }

    debug!(
        layers = manifest.layers.len(),
        digest = revision.as_deref().unwrap_or("unknown"),
        "resolved manifest"
    );

    let mut total: u64 = 0;
    let mut first_artifact: Option<PathBuf> = None;
    for layer in &manifest.layers {
        let blob_url = format!(
            "{}://{}/v2/{}/blobs/{}",
            reference.scheme, reference.registry, reference.repository, layer.digest
        );
        let filename = layer
            .annotations
            .get(LAYER_TITLE_ANNOTATION)
            .cloned()
            .unwrap_or_else(|| layer.digest.replace(':', "-"));

        let bytes = fetch_blob(client, &blob_url, token.as_deref(), into_dir, &filename).await?;
        total += bytes;
        if first_artifact.is_none() {
            first_artifact = Some(PathBuf::from(&filename));
        }
    }

    let artifact = if manifest.layers.len() == 1 {
        first_artifact
    } else {
        None
    };

    Ok(Metadata {
        transport: Transport::Oci,
        artifact,
        revision,
        bytes: Some(total),
    })
}

fn manifest_request(client: &Client, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
    let mut request = client.get(url).header(ACCEPT, MANIFEST_ACCEPT);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    request
}

/// Follows the bearer challenge on a 401 response and fetches a pull token.
///
/// Returns `Ok(None)` when the response carries no parseable challenge; the
/// caller then surfaces the original 401. A challenge whose realm is not an
/// absolute URL is a protocol error.
async fn request_token(
    client: &Client,
    response: &reqwest::Response,
    manifest_url: &str,
) -> Result<Option<String>, EngineError> {
    let challenge = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_bearer_challenge);
    let Some(challenge) = challenge else {
        return Ok(None);
    };

    debug!(realm = %challenge.realm, "requesting pull token");
    let mut token_url = Url::parse(&challenge.realm).map_err(|e| {
        EngineError::protocol(
            manifest_url,
            format!("invalid token realm `{}`: {e}", challenge.realm),
        )
    })?;
    {
        let mut pairs = token_url.query_pairs_mut();
        if let Some(service) = &challenge.service {
            pairs.append_pair("service", service);
        }
        if let Some(scope) = &challenge.scope {
            pairs.append_pair("scope", scope);
        }
    }

    let token_response = client
        .get(token_url)
        .send()
        .await
        .map_err(|e| EngineError::network(&challenge.realm, e))?;
    let status = token_response.status();
    if !status.is_success() {
        return Err(EngineError::protocol(
            manifest_url,
            format!("token endpoint returned HTTP {}", status.as_u16()),
        ));
    }

    let token: TokenResponse = token_response
        .json()
        .await
        .map_err(|e| EngineError::protocol(manifest_url, format!("invalid token response: {e}")))?;
    Ok(token.token.or(token.access_token))
}

async fn fetch_blob(
    client: &Client,
    url: &str,
    token: Option<&str>,
    into_dir: &Path,
    filename: &str,
) -> Result<u64, EngineError> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| EngineError::network(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(EngineError::http_status(url, status.as_u16()));
    }

    let path = into_dir.join(filename);
    let stream_result = http::stream_to_file(response, url, &path).await;
    if stream_result.is_err() {
        let _ = tokio::fs::remove_file(&path).await;
    }
    stream_result
}

/// Splits `registry/repository[:tag|@digest]` with an optional scheme prefix.
///
/// The registry part may carry a port. A digest pin (`@sha256:…`) wins over a
/// tag; with neither, the tag defaults to `latest`. Plain `http://` is kept
/// when given explicitly so registries on loopback work; everything else is
/// addressed over HTTPS.
fn parse_reference(location: &str) -> Result<Reference, EngineError> {
    let (scheme, rest) = if let Some(rest) = location.strip_prefix("http://") {
        ("http", rest)
    } else if let Some(rest) = location.strip_prefix("https://") {
        ("https", rest)
    } else {
        ("https", location)
    };

    let Some((registry, remainder)) = rest.split_once('/') else {
        return Err(EngineError::malformed_source(
            location,
            "expected registry/repository form",
        ));
    };
    if registry.is_empty() {
        return Err(EngineError::malformed_source(location, "empty registry"));
    }

    let (repository, reference) = if let Some((repo, digest)) = remainder.split_once('@') {
        (repo, digest.to_string())
    } else {
        match remainder.rsplit_once(':') {
            Some((repo, tag)) if !tag.contains('/') => (repo, tag.to_string()),
            _ => (remainder, "latest".to_string()),
        }
    };
    if repository.is_empty() {
        return Err(EngineError::malformed_source(location, "empty repository"));
    }

    Ok(Reference {
        scheme,
        registry: registry.to_string(),
        repository: repository.to_string(),
        reference,
    })
}

fn parse_bearer_challenge(header: &str) -> Option<BearerChallenge> {
    let params = header.strip_prefix("Bearer ")?;
    let mut realm = None;
    let mut service = None;
    let mut scope = None;
    for part in params.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"').to_string();
        match key {
            "realm" => realm = Some(value),
            "service" => service = Some(value),
            "scope" => scope = Some(value),
            _ => {}
        }
    }
    Some(BearerChallenge {
        realm: realm?,
        service,
        scope,
    })
}
