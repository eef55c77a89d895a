//! Sequential processing of resolved topics.
//!
//! Topics never run concurrently with each other. For each topic the
//! orchestrator lists its items, hands them to the [`WorkerPool`], records a
//! [`RunSummary`], and pauses before the next topic. No state is carried
//! from one topic to the next.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::listing::ListFetcher;
use crate::pool::{PoolError, ProgressCounter, WorkerPool};
use crate::topics::Topic;

/// Per-topic result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The processed topic.
    pub topic: Topic,
    /// Items discovered on the list endpoint.
    pub total_items: usize,
    /// Items written as documents.
    pub success_count: usize,
    /// The topic was cut short by cancellation.
    pub interrupted: bool,
}

/// Callback invoked with each topic's summary as soon as the topic finishes.
pub type TopicReporter = Arc<dyn Fn(&RunSummary) + Send + Sync>;

/// Drives listing and the worker pool topic by topic.
pub struct Orchestrator {
    list_fetcher: ListFetcher,
    pool: WorkerPool,
    output_root: PathBuf,
    topic_pause: Duration,
    show_progress: bool,
    cancel: CancellationToken,
    on_topic: Option<TopicReporter>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("list_fetcher", &self.list_fetcher)
            .field("pool", &self.pool)
            .field("output_root", &self.output_root)
            .field("topic_pause", &self.topic_pause)
            .field("show_progress", &self.show_progress)
            .field("on_topic", &self.on_topic.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator writing topic folders under `output_root`.
    pub fn new(
        list_fetcher: ListFetcher,
        pool: WorkerPool,
        output_root: impl Into<PathBuf>,
        topic_pause: Duration,
    ) -> Self {
        Self {
            list_fetcher,
            pool,
            output_root: output_root.into(),
            topic_pause,
            show_progress: false,
            cancel: CancellationToken::new(),
            on_topic: None,
        }
    }

    /// Draws a progress bar per topic.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Stops before the next topic (and cuts the pause short) once `cancel` fires.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Reports every topic summary through `reporter` as it is recorded.
    #[must_use]
    pub fn with_topic_reporter(mut self, reporter: TopicReporter) -> Self {
        self.on_topic = Some(reporter);
        self
    }

    fn record(&self, summaries: &mut Vec<RunSummary>, summary: RunSummary) {
        if let Some(report) = &self.on_topic {
            report(&summary);
        }
        summaries.push(summary);
    }

    /// Processes `topics` in order.
    ///
    /// A pause follows every topic that had items, except the last topic.
    /// Empty topics are never followed by a pause.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] only if the pool itself breaks; per-item and
    /// per-list failures are reflected in the summaries.
    #[instrument(skip(self, topics), fields(topics = topics.len()))]
    pub async fn run(&self, topics: &[Topic]) -> Result<Vec<RunSummary>, PoolError> {
        let mut summaries = Vec::with_capacity(topics.len());

        for (index, topic) in topics.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(remaining = topics.len() - index, "cancelled; skipping remaining topics");
                break;
            }

            let items = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    warn!(topic = %topic.folder, "cancelled while listing");
                    break;
                }
                items = self.list_fetcher.fetch(&topic.id) => items,
            };
            let total_items = items.len();
            info!(topic = %topic.folder, id = %topic.id, count = total_items, "articles discovered");

            if total_items == 0 {
                self.record(
                    &mut summaries,
                    RunSummary {
                        topic: topic.clone(),
                        total_items,
                        success_count: 0,
                        interrupted: false,
                    },
                );
                continue;
            }

            let folder = self.output_root.join(&topic.folder);
            let total = u64::try_from(total_items).unwrap_or(u64::MAX);
            let progress = Arc::new(
                ProgressCounter::new(total, self.show_progress).with_message(topic.folder.clone()),
            );
            let stats = self.pool.run(items, &folder, progress).await?;

            info!(
                topic = %topic.folder,
                succeeded = stats.succeeded,
                total = total_items,
                "topic complete"
            );
            self.record(
                &mut summaries,
                RunSummary {
                    topic: topic.clone(),
                    total_items,
                    success_count: stats.succeeded,
                    interrupted: stats.interrupted,
                },
            );

            if stats.interrupted {
                break;
            }
            if index + 1 < topics.len() && !self.topic_pause.is_zero() {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep(self.topic_pause) => {}
                }
            }
        }

        Ok(summaries)
    }
}
