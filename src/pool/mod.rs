//! Bounded-concurrency processing of one topic's items.
//!
//! The [`WorkerPool`] spawns one Tokio task per [`ItemReference`], gated by a
//! semaphore so that at most `concurrency` items are in flight:
//!
//! - Permits are acquired in submission order; completion order is unspecified
//! - Each permit is released when its task exits (RAII)
//! - Every task body is panic-isolated and reduced to a success flag
//! - Every completed task advances the progress reporter exactly once
//!
//! Per-item failures never surface as errors from [`WorkerPool::run`]; they
//! are only counted.

mod progress;

pub use progress::{ProgressCounter, ProgressReporter};

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::constants::MAX_WORKERS;
use crate::detail::FetchOutcome;
use crate::document::DocumentSink;
use crate::listing::ItemReference;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Produces one [`FetchOutcome`] per URL. Must not panic by contract, but
/// the pool tolerates it if it does.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetches and classifies `url`.
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Error type for worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_WORKERS}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Counts from one [`WorkerPool::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Items dispatched to a task.
    pub submitted: usize,
    /// Items whose document was written.
    pub succeeded: usize,
    /// Items that ended in any other way.
    pub failed: usize,
    /// Dispatch stopped early because the run was cancelled.
    pub interrupted: bool,
}

#[derive(Debug, Default)]
struct Counters {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn record(&self, succeeded: bool) {
        if succeeded {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs fetch-then-write for each item under a concurrency bound.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    fetcher: Arc<dyn ContentFetcher>,
    sink: Arc<dyn DocumentSink>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("concurrency", &self.concurrency)
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Creates a pool running at most `concurrency` items at once.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug", skip(fetcher, sink))]
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        sink: Arc<dyn DocumentSink>,
        concurrency: usize,
    ) -> Result<Self, PoolError> {
        if !(MIN_CONCURRENCY..=MAX_WORKERS).contains(&concurrency) {
            return Err(PoolError::InvalidConcurrency { value: concurrency });
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            fetcher,
            sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Stops dispatching new items once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Processes `items`, writing successful documents under `folder`.
    ///
    /// Returns once every dispatched task has completed.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::SemaphoreClosed`] if the semaphore is closed.
    /// Individual item failures do NOT cause this method to error.
    #[instrument(skip(self, items, progress), fields(items = items.len(), folder = %folder.display()))]
    pub async fn run(
        &self,
        items: Vec<ItemReference>,
        folder: &Path,
        progress: Arc<dyn ProgressReporter>,
    ) -> Result<PoolStats, PoolError> {
        let counters = Arc::new(Counters::default());
        let mut handles = Vec::with_capacity(items.len());
        let mut interrupted = false;

        for item in items {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                permit = Arc::clone(&self.semaphore).acquire_owned() => {
                    Some(permit.map_err(|_| PoolError::SemaphoreClosed)?)
                }
            };
            let Some(permit) = permit else {
                interrupted = true;
                break;
            };

            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&self.sink);
            let counters = Arc::clone(&counters);
            let progress = Arc::clone(&progress);
            let folder = folder.to_path_buf();

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let url = item.url;

                let succeeded = match AssertUnwindSafe(process_item(
                    fetcher.as_ref(),
                    sink.as_ref(),
                    &url,
                    &folder,
                ))
                .catch_unwind()
                .await
                {
                    Ok(succeeded) => succeeded,
                    Err(_) => {
                        warn!(url = %url, "item task panicked");
                        false
                    }
                };

                counters.record(succeeded);
                progress.advance();
            }));
        }

        let submitted = handles.len();
        if interrupted {
            warn!(submitted, "cancelled; waiting for in-flight items");
        }
        debug!(task_count = submitted, "waiting for items to complete");

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "item task aborted");
                counters.record(false);
                progress.advance();
            }
        }
        progress.finish();

        let stats = PoolStats {
            submitted,
            succeeded: counters.succeeded.load(Ordering::SeqCst),
            failed: counters.failed.load(Ordering::SeqCst),
            interrupted,
        };
        info!(
            submitted = stats.submitted,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "topic items processed"
        );
        Ok(stats)
    }
}

/// Fetches one item and persists it on success.
async fn process_item(
    fetcher: &dyn ContentFetcher,
    sink: &dyn DocumentSink,
    url: &str,
    folder: &Path,
) -> bool {
    match fetcher.fetch(url).await {
        FetchOutcome::Success(content) => match sink.write(&content, folder) {
            Ok(path) => {
                info!(url = %url, path = %path.display(), "article saved");
                true
            }
            Err(e) => {
                warn!(url = %url, title = %content.title(), error = %e, "failed to write document");
                false
            }
        },
        outcome => {
            debug!(url = %url, failure = ?outcome.failure_type(), "item not saved");
            false
        }
    }
}
