//! Bounded polling of a remote on-page task.

use crate::error::{AuditError, Result};
use crate::models::{AnalysisTask, OnPageSummary, ProgressEvent, TaskState};
use std::future::Future;
use std::time::Duration;

/// One status read of a remote task. `Ok(None)` means "not ready yet".
pub trait TaskStatusSource {
    fn fetch_status(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<Option<OnPageSummary>>> + Send;
}

/// The timed wait between two polls
pub trait Delay {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u64,
}

pub struct TaskPoller<D = TokioDelay> {
    config: PollerConfig,
    delay: D,
}

impl TaskPoller<TokioDelay> {
    pub fn new(config: PollerConfig) -> Self {
        Self::with_delay(config, TokioDelay)
    }
}

impl<D: Delay> TaskPoller<D> {
    pub fn with_delay(config: PollerConfig, delay: D) -> Self {
        Self { config, delay }
    }

    /// Reads the task status until the crawl reports `finished`, until
    /// `total_pages` pages have been crawled, or until `max_attempts` reads
    /// have gone by without either.
    ///
    /// Exactly one request is outstanding at a time. A failed read ends the
    /// loop at once; a read without a result body is waited out. `on_progress`
    /// only fires for reads that carried a result body, and the reported page
    /// count never goes down within one run.
    pub async fn poll<S, F>(
        &self,
        source: &S,
        task: &mut AnalysisTask,
        total_pages: u64,
        mut on_progress: F,
    ) -> Result<OnPageSummary>
    where
        S: TaskStatusSource,
        F: FnMut(ProgressEvent),
    {
        task.state = TaskState::Polling;
        let mut attempts = 0;
        let mut reported_pages = 0;

        while attempts < self.config.max_attempts {
            let summary = match source.fetch_status(&task.id).await {
                Ok(summary) => summary,
                Err(e) => {
                    task.state = TaskState::Failed;
                    tracing::error!(task_id = %task.id, attempt = attempts + 1, error = %e, "Status query failed");
                    return Err(e);
                }
            };

            match summary {
                Some(summary) => {
                    let pages_crawled = summary.pages_crawled();
                    reported_pages = reported_pages.max(pages_crawled);
                    let event = ProgressEvent::new(reported_pages, total_pages);
                    tracing::debug!(
                        task_id = %task.id,
                        progress = %summary.crawl_progress,
                        pages_crawled,
                        percent = event.percent,
                        "Task progress"
                    );
                    on_progress(event);

                    if summary.is_finished() || pages_crawled >= total_pages {
                        task.state = TaskState::Finished;
                        tracing::info!(
                            task_id = %task.id,
                            attempts = attempts + 1,
                            pages_crawled,
                            "Task finished"
                        );
                        return Ok(summary);
                    }
                }
                None => {
                    tracing::debug!(task_id = %task.id, attempt = attempts + 1, "Task result not ready");
                }
            }

            self.delay.wait(self.config.interval).await;
            attempts += 1;
        }

        task.state = TaskState::TimedOut;
        tracing::warn!(task_id = %task.id, attempts, "Gave up waiting for task");

        Err(AuditError::TaskTimeout {
            task_id: task.id.clone(),
            attempts,
        })
    }
}
