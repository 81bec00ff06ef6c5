//! Shared User-Agent string for outbound HTTP traffic.
//!
//! Single source for project URL and UA format so HTTP, object-store and OCI
//! traffic stay consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/bundlefetch/bundlefetch";

/// Default User-Agent for fetch requests (identifies the tool).
#[must_use]
pub(crate) fn default_fetch_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("bundlefetch/{version} (policy-bundle-fetcher; +{PROJECT_UA_URL})")
}
