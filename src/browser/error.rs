//! Error types for the rendering engines.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while launching an engine or driving a session.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The engine process could not be started or configured.
    #[error("failed to launch browser: {reason}")]
    Launch {
        /// Engine-provided description.
        reason: String,
    },

    /// An isolated session could not be created or used.
    #[error("browser session error: {reason}")]
    Session {
        /// Engine-provided description.
        reason: String,
    },

    /// A navigation or marker wait exceeded its deadline.
    #[error("timed out after {}ms waiting for {stage} on {url}", timeout.as_millis())]
    Timeout {
        /// Page being rendered.
        url: String,
        /// What was awaited (`navigation` or the marker selector).
        stage: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// Navigation failed before the deadline (DNS, refused connection, HTTP error).
    #[error("navigation to {url} failed: {reason}")]
    Navigation {
        /// Page being rendered.
        url: String,
        /// Engine-provided description.
        reason: String,
    },

    /// The rendered document could not be read back.
    #[error("failed to snapshot {url}: {reason}")]
    Snapshot {
        /// Page being rendered.
        url: String,
        /// Engine-provided description.
        reason: String,
    },

    /// A marker selector is not valid CSS.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// Offending selector.
        selector: String,
        /// Parser-provided description.
        reason: String,
    },

    /// The URL is malformed or uses an unsupported scheme.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },
}

impl BrowserError {
    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>, stage: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            stage: stage.into(),
            timeout,
        }
    }

    /// Creates a navigation error.
    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a session error.
    pub fn session(reason: impl ToString) -> Self {
        Self::Session {
            reason: reason.to_string(),
        }
    }

    /// Returns true for deadline-related failures.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
