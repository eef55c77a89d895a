//! Per-topic progress reporting.

use std::sync::{Mutex, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};

/// Receives one advance per completed item.
///
/// Implementations are shared by every task of a pool run and must
/// serialize their own updates.
pub trait ProgressReporter: Send + Sync {
    /// Records one completed item, successful or not.
    fn advance(&self);

    /// Called once after every item has completed.
    fn finish(&self) {}
}

/// Mutex-guarded completion counter with an optional terminal bar.
///
/// The mutex is the single point every task passes through, so the
/// position only ever moves forward one unit at a time.
#[derive(Debug)]
pub struct ProgressCounter {
    position: Mutex<u64>,
    bar: ProgressBar,
}

impl ProgressCounter {
    /// Creates a counter for `total` items, drawn on stderr when `visible`.
    #[must_use]
    pub fn new(total: u64, visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len} ({elapsed})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            position: Mutex::new(0),
            bar,
        }
    }

    /// Labels the bar, typically with the topic folder.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        self.bar.set_message(message.into());
        self
    }

    /// Items recorded so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressReporter for ProgressCounter {
    fn advance(&self) {
        let mut position = self.position.lock().unwrap_or_else(PoisonError::into_inner);
        *position += 1;
        self.bar.set_position(*position);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
