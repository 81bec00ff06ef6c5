//! Loopback gate for tests that need a wiremock listener.
//!
//! Restricted sandboxes can refuse loopback binds outright, which would turn
//! every mock-server test into a spurious failure. Callers ask
//! [`start_mock_server_or_skip`] for a server and bail out quietly on `None`.
//! Exporting `BUNDLEFETCH_REQUIRE_SOCKET_TESTS=1` flips the quiet skip into a
//! panic for hosts where loopback support is guaranteed.

use std::net::{Ipv4Addr, TcpListener};
use std::panic::Location;

use wiremock::MockServer;

const FAIL_FAST_ENV: &str = "BUNDLEFETCH_REQUIRE_SOCKET_TESTS";

fn fail_fast_requested() -> bool {
    std::env::var(FAIL_FAST_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Checks whether a loopback socket can bind, reporting the caller that skips.
#[track_caller]
#[must_use]
pub fn loopback_unavailable() -> bool {
    if TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).is_ok() {
        return false;
    }

    let caller = Location::caller();
    if fail_fast_requested() {
        panic!(
            "no loopback socket at {}:{} but {FAIL_FAST_ENV} demands socket tests",
            caller.file(),
            caller.line()
        );
    }
    eprintln!(
        "no loopback socket at {}:{}; skipping (export {FAIL_FAST_ENV}=1 to fail instead)",
        caller.file(),
        caller.line()
    );
    true
}

/// Starts a mock server, or returns `None` when this environment cannot host
/// one and the test should skip.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if loopback_unavailable() {
        return None;
    }
    Some(MockServer::start().await)
}
