//! Rendering engines for list endpoints and detail pages.
//!
//! # Architecture
//!
//! - [`Browser`] - Async trait that opens isolated rendering sessions
//! - [`BrowserSession`] - One isolated page: navigate, wait for markers, snapshot
//! - [`SessionGuard`] - Scoped acquisition that releases the session on every exit path
//! - [`ChromiumBrowser`] - Headless Chromium over CDP, one browser context per session
//! - [`HttpBrowser`] - Static GET-based engine for hosts without Chromium
//!
//! Sessions are never shared: each caller acquires its own and releases it,
//! so concurrent fetches never observe each other's cookies or storage.

mod chromium;
mod error;
mod http;

pub use chromium::ChromiumBrowser;
pub use error::BrowserError;
pub use http::HttpBrowser;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

/// A rendering engine capable of opening isolated sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Returns the engine name used in logs.
    fn name(&self) -> &'static str;

    /// Opens a new session with its own cookie and storage context.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Session`] when the engine cannot create a context.
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One isolated page owned by a single task.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url`, failing with [`BrowserError::Timeout`] after `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    /// Waits until `selector` matches an element of the current page.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Returns a static snapshot of the rendered document.
    async fn content(&mut self) -> Result<String, BrowserError>;

    /// Releases every resource held by the session.
    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Scoped session acquisition.
///
/// [`SessionGuard::release`] is the normal exit path and awaits the close.
/// If a guard is dropped without being released (a panic unwinding through
/// the owner), the close is scheduled on the current Tokio runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn BrowserSession>>,
    label: String,
}

impl SessionGuard {
    /// Opens a session on `browser`. `label` identifies the owner in logs.
    ///
    /// # Errors
    ///
    /// Propagates the engine's session creation error.
    pub async fn acquire(
        browser: &dyn Browser,
        label: impl Into<String>,
    ) -> Result<Self, BrowserError> {
        let label = label.into();
        let session = browser.open_session().await?;
        debug!(engine = browser.name(), label = %label, "session acquired");
        Ok(Self {
            session: Some(session),
            label,
        })
    }

    fn session_mut(&mut self) -> Result<&mut Box<dyn BrowserSession>, BrowserError> {
        self.session.as_mut().ok_or_else(|| BrowserError::Session {
            reason: format!("session for {} already released", self.label),
        })
    }

    /// See [`BrowserSession::navigate`].
    ///
    /// # Errors
    ///
    /// Propagates the session's navigation error.
    pub async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.session_mut()?.navigate(url, timeout).await
    }

    /// See [`BrowserSession::wait_for_selector`].
    ///
    /// # Errors
    ///
    /// Propagates the session's wait error.
    pub async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.session_mut()?.wait_for_selector(selector, timeout).await
    }

    /// See [`BrowserSession::content`].
    ///
    /// # Errors
    ///
    /// Propagates the session's snapshot error.
    pub async fn content(&mut self) -> Result<String, BrowserError> {
        self.session_mut()?.content().await
    }

    /// Closes the session. Close failures are logged, never returned:
    /// the owner already has its result and cannot act on them.
    pub async fn release(mut self) {
        if let Some(session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!(label = %self.label, "session released"),
                Err(e) => warn!(label = %self.label, error = %e, "failed to close session"),
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let label = std::mem::take(&mut self.label);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(label = %label, "session dropped without release; closing in background");
                handle.spawn(async move {
                    if let Err(e) = session.close().await {
                        warn!(label = %label, error = %e, "background session close failed");
                    }
                });
            }
            Err(_) => warn!(label = %label, "session dropped outside a runtime; leaking it"),
        }
    }
}
