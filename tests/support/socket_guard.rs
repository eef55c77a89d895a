//! Skips wiremock tests on hosts that forbid binding localhost sockets.
//!
//! Set `ARTICLE_HARVESTER_REQUIRE_SOCKET_TESTS=1` in CI so a sandbox that
//! silently disables these tests fails loudly instead.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "ARTICLE_HARVESTER_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when localhost cannot be bound.
///
/// # Panics
///
/// Panics instead of skipping when [`REQUIRE_ENV`] is set.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl std::future::Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let bindable = TcpListener::bind("127.0.0.1:0").is_ok();
    if !bindable {
        let message = format!(
            "[socket-bound-test] {}:{} cannot bind a localhost socket",
            caller.file(),
            caller.line()
        );
        assert!(!sockets_required(), "{message}; unset {REQUIRE_ENV} to allow skipping");
        eprintln!("{message}; skipping");
    }
    async move {
        if bindable {
            Some(MockServer::start().await)
        } else {
            None
        }
    }
}

/// Binds a started mock server, or returns from the test when sockets are unavailable.
#[macro_export]
macro_rules! require_mock_server {
    () => {{
        let Some(server) = $crate::support::socket_guard::start_mock_server_or_skip().await else {
            return;
        };
        server
    }};
}
