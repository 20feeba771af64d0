//! Bounded-concurrency dispatch of identifier jobs.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use asinpix_core::{Identifier, InputError, Storefront};
use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::download::ImageDownloader;
use crate::extract::ImageUrlExtractor;
use crate::fetcher::PageFetcher;
use crate::job::{IdentifierJob, JobContext};
use crate::types::{EventSink, JobOutcome, PipelineEvent, RunProgress, RunSummary};

/// Cooperative stop request, checked before each identifier is admitted.
///
/// Jobs already running are not interrupted.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct PipelineScheduler {
    ctx: Arc<JobContext>,
    max_concurrent_jobs: usize,
    stop: StopSignal,
}

impl PipelineScheduler {
    /// `max_concurrent_jobs` bounds the number of simultaneously open fetch
    /// sessions; values below 1 are treated as 1.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<dyn ImageUrlExtractor>,
        downloader: ImageDownloader,
        max_concurrent_jobs: usize,
    ) -> Self {
        Self {
            ctx: Arc::new(JobContext {
                fetcher,
                extractor,
                downloader,
            }),
            max_concurrent_jobs: max_concurrent_jobs.max(1),
            stop: StopSignal::new(),
        }
    }

    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops admission of further identifiers when triggered.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    #[must_use]
    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    /// Runs one job per identifier and returns the outcomes in input order.
    ///
    /// Jobs are admitted in input order and may finish in any order. A
    /// [`PipelineEvent::Progress`] is emitted after each one finishes, so the
    /// reported count rises by one each time and reaches the total exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Input problems are reported before any job starts:
    /// - [`InputError::NoIdentifiers`] if `identifiers` is empty.
    /// - [`InputError::NoStorefronts`] if `storefronts` is empty.
    /// - [`InputError::OutputDir`] if `base_dir` cannot be created.
    pub async fn run(
        &self,
        identifiers: &[Identifier],
        storefronts: &[Storefront],
        base_dir: &Path,
        events: EventSink,
    ) -> Result<RunSummary, InputError> {
        if identifiers.is_empty() {
            return Err(InputError::NoIdentifiers);
        }
        if storefronts.is_empty() {
            return Err(InputError::NoStorefronts);
        }
        tokio::fs::create_dir_all(base_dir)
            .await
            .map_err(|source| InputError::OutputDir {
                path: base_dir.display().to_string(),
                source,
            })?;

        let started_at = Utc::now();
        let total = identifiers.len();
        let storefronts: Arc<[Storefront]> = Arc::from(storefronts);
        let base_dir: Arc<Path> = Arc::from(base_dir);

        tracing::info!(
            identifiers = total,
            storefronts = storefronts.len(),
            max_concurrent_jobs = self.max_concurrent_jobs,
            output = %base_dir.display(),
            "starting run"
        );

        let mut pending = stream::iter(identifiers.iter().cloned().enumerate())
            .map(|(index, identifier)| {
                let admitted = !self.stop.is_stopped();
                let job = IdentifierJob::new(
                    identifier.clone(),
                    Arc::clone(&storefronts),
                    Arc::clone(&base_dir),
                    Arc::clone(&self.ctx),
                    Arc::clone(&events),
                );
                async move {
                    if !admitted {
                        tracing::info!(identifier = %identifier, "stop requested, identifier skipped");
                        return (index, JobOutcome::Cancelled { identifier }, false);
                    }
                    // Spawned so a panic inside one job surfaces as a JoinError.
                    match tokio::spawn(job.run()).await {
                        Ok(outcome) => (index, outcome, true),
                        Err(e) => {
                            tracing::error!(identifier = %identifier, error = %e, "identifier job panicked");
                            let outcome = JobOutcome::Failed {
                                identifier,
                                cause: format!("job panicked: {e}"),
                                storefronts: Vec::new(),
                            };
                            (index, outcome, false)
                        }
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_jobs);

        let mut slots: Vec<Option<JobOutcome>> = vec![None; total];
        let mut completed = 0usize;
        while let Some((index, outcome, announced)) = pending.next().await {
            completed += 1;
            if !outcome.is_completed() {
                tracing::warn!(
                    identifier = %outcome.identifier(),
                    outcome = outcome_kind(&outcome),
                    "identifier did not complete"
                );
            }
            if !announced {
                events(&PipelineEvent::JobFinished {
                    identifier: outcome.identifier().clone(),
                    completed: false,
                });
            }
            slots[index] = Some(outcome);
            events(&PipelineEvent::Progress(RunProgress { completed, total }));
        }

        let jobs: Vec<JobOutcome> = slots.into_iter().flatten().collect();
        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            jobs,
        };

        tracing::info!(
            completed = summary.completed_count(),
            failed = summary.failed_count(),
            cancelled = summary.cancelled_count(),
            "run finished"
        );
        Ok(summary)
    }
}

fn outcome_kind(outcome: &JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Completed { .. } => "completed",
        JobOutcome::Failed { .. } => "failed",
        JobOutcome::Cancelled { .. } => "cancelled",
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
