//! Detail page fetching with bounded, classified retries.
//!
//! Each call to [`DetailFetcher::fetch`] owns one isolated browser session
//! for its whole lifetime and walks an explicit per-attempt state machine:
//!
//! ```text
//! Navigating -> WaitingForMarkers -> Ready
//!      |               |
//!      +---> TimedOut <+ --(retry policy)--> Navigating | give up
//! ```
//!
//! Once a page is ready its snapshot is parsed exactly once. Missing regions
//! and rejected content are final; only timeouts are retried. Every path,
//! including cancellation, releases the session before returning, and the
//! caller only ever observes a [`FetchOutcome`].

mod content;
mod extract;
mod retry;

pub use content::{
    FetchOutcome, StructuralFailure, StructuredContent, TransientFailure, ValidationFailure,
};
pub use extract::{CompiledMarkers, ExtractError, SelectorError, extract_content};
pub use retry::{FailureType, RetryDecision, RetryPolicy};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::browser::{Browser, BrowserError, SessionGuard};
use crate::pool::ContentFetcher;
use crate::settings::{CrawlSettings, PageMarkers};

/// Per-attempt state of a detail page render.
#[derive(Debug)]
enum AttemptState {
    Navigating { attempt: u32 },
    WaitingForMarkers { attempt: u32 },
    Ready,
    TimedOut { attempt: u32, error: BrowserError },
}

/// Renders detail pages and extracts their content.
pub struct DetailFetcher {
    browser: Arc<dyn Browser>,
    policy: RetryPolicy,
    wait_markers: Vec<String>,
    markers: CompiledMarkers,
    navigation_timeout: Duration,
    marker_timeout: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DetailFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailFetcher")
            .field("engine", &self.browser.name())
            .field("policy", &self.policy)
            .field("wait_markers", &self.wait_markers)
            .field("navigation_timeout", &self.navigation_timeout)
            .field("marker_timeout", &self.marker_timeout)
            .finish_non_exhaustive()
    }
}

impl DetailFetcher {
    /// Creates a fetcher from crawl settings.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if any page marker is not valid CSS.
    pub fn new(browser: Arc<dyn Browser>, settings: &CrawlSettings) -> Result<Self, SelectorError> {
        Self::with_markers(
            browser,
            RetryPolicy::new(settings.max_attempts, settings.retry_backoff),
            &settings.markers,
            settings.navigation_timeout,
            settings.marker_timeout,
        )
    }

    /// Creates a fetcher with explicit policy, markers, and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if any page marker is not valid CSS.
    pub fn with_markers(
        browser: Arc<dyn Browser>,
        policy: RetryPolicy,
        markers: &PageMarkers,
        navigation_timeout: Duration,
        marker_timeout: Duration,
    ) -> Result<Self, SelectorError> {
        Ok(Self {
            browser,
            policy,
            wait_markers: markers.wait_markers.clone(),
            markers: CompiledMarkers::compile(markers)?,
            navigation_timeout,
            marker_timeout,
            cancel: CancellationToken::new(),
        })
    }

    /// Aborts in-flight waits and backoffs when `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetches `url` and classifies the result.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        if self.cancel.is_cancelled() {
            return FetchOutcome::TransientFailure(TransientFailure::Cancelled);
        }

        let mut session = match SessionGuard::acquire(self.browser.as_ref(), url).await {
            Ok(session) => session,
            Err(e) => {
                warn!(url = %url, error = %e, "failed to open browser session");
                return FetchOutcome::TransientFailure(TransientFailure::SessionUnavailable);
            }
        };

        let rendered = self.render(&mut session, url).await;
        session.release().await;

        let html = match rendered {
            Ok(html) => html,
            Err(failure) => {
                warn!(url = %url, reason = %failure, "detail page not rendered");
                return FetchOutcome::TransientFailure(failure);
            }
        };

        match extract_content(&html, url, &self.markers) {
            Ok(content) => {
                debug!(url = %url, title = %content.title(), "content extracted");
                FetchOutcome::Success(content)
            }
            Err(ExtractError::Structural(failure)) => {
                let verdict = self.verdict(FailureType::Structural);
                warn!(url = %url, reason = %failure, %verdict, "page structure mismatch");
                FetchOutcome::StructuralFailure(failure)
            }
            Err(ExtractError::Validation(failure)) => {
                let title = self.markers.title_text(&html).unwrap_or_default();
                let verdict = self.verdict(FailureType::Validation);
                warn!(url = %url, title = %title, reason = %failure, %verdict, "content rejected");
                FetchOutcome::ValidationFailure(failure)
            }
        }
    }

    /// What the retry policy says about a failure found after extraction.
    fn verdict(&self, kind: FailureType) -> String {
        match self.policy.should_retry(kind, 1) {
            RetryDecision::DoNotRetry { reason } => reason,
            RetryDecision::Retry { .. } => "not retried after extraction".to_string(),
        }
    }

    /// Drives the attempt state machine until the page is ready or the
    /// policy gives up, then snapshots the page.
    async fn render(
        &self,
        session: &mut SessionGuard,
        url: &str,
    ) -> Result<String, TransientFailure> {
        let mut state = AttemptState::Navigating { attempt: 1 };

        loop {
            state = match state {
                AttemptState::Navigating { attempt } => {
                    debug!(url = %url, attempt, "navigating");
                    let navigated = self
                        .until_cancelled(session.navigate(url, self.navigation_timeout))
                        .await?;
                    match navigated {
                        Ok(()) => AttemptState::WaitingForMarkers { attempt },
                        Err(error) => AttemptState::TimedOut { attempt, error },
                    }
                }
                AttemptState::WaitingForMarkers { attempt } => {
                    match self.wait_for_markers(session).await? {
                        Ok(()) => AttemptState::Ready,
                        Err(error) => AttemptState::TimedOut { attempt, error },
                    }
                }
                AttemptState::TimedOut { attempt, error } => {
                    match self.policy.should_retry(FailureType::Transient, attempt) {
                        RetryDecision::Retry {
                            delay,
                            attempt: next_attempt,
                        } => {
                            info!(
                                url = %url,
                                attempt = next_attempt,
                                max_attempts = self.policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                timeout = error.is_timeout(),
                                error = %error,
                                "retrying detail page"
                            );
                            self.until_cancelled(tokio::time::sleep(delay)).await?;
                            AttemptState::Navigating {
                                attempt: next_attempt,
                            }
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(
                                url = %url,
                                %reason,
                                timeout = error.is_timeout(),
                                error = %error,
                                "giving up"
                            );
                            return Err(TransientFailure::RetriesExhausted { attempts: attempt });
                        }
                    }
                }
                AttemptState::Ready => {
                    return match self.until_cancelled(session.content()).await? {
                        Ok(html) => Ok(html),
                        Err(e) => {
                            warn!(url = %url, error = %e, "snapshot failed");
                            Err(TransientFailure::SnapshotFailed)
                        }
                    };
                }
            };
        }
    }

    async fn wait_for_markers(
        &self,
        session: &mut SessionGuard,
    ) -> Result<Result<(), BrowserError>, TransientFailure> {
        for marker in &self.wait_markers {
            let waited = self
                .until_cancelled(session.wait_for_selector(marker, self.marker_timeout))
                .await?;
            if let Err(e) = waited {
                return Ok(Err(e));
            }
        }
        Ok(Ok(()))
    }

    /// Runs `fut` unless the token fires first.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Result<F::Output, TransientFailure> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(TransientFailure::Cancelled),
            output = fut => Ok(output),
        }
    }
}

#[async_trait]
impl ContentFetcher for DetailFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        DetailFetcher::fetch(self, url).await
    }
}
