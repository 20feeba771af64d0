use std::path::PathBuf;
use std::sync::Arc;

use asinpix_core::{Identifier, Storefront};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Result of downloading one image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Failed { url: String, reason: String },
}

/// A single image that could not be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadFailure {
    /// 1-based position in extraction order.
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// What happened on one storefront for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StorefrontStatus {
    /// Images were discovered; `failed` lists the ones that did not download.
    Images {
        saved: Vec<PathBuf>,
        failed: Vec<DownloadFailure>,
    },
    NoImages,
    FetchFailed { reason: String },
    OutputFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorefrontReport {
    pub storefront: Storefront,
    #[serde(flatten)]
    pub status: StorefrontStatus,
}

/// Outcome of one identifier job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Every storefront was visited; individual results may be empty or failed.
    Completed {
        identifier: Identifier,
        storefronts: Vec<StorefrontReport>,
    },
    /// The session failed; storefronts visited before the failure are kept.
    Failed {
        identifier: Identifier,
        cause: String,
        storefronts: Vec<StorefrontReport>,
    },
    /// Never admitted because a stop was requested.
    Cancelled { identifier: Identifier },
}

impl JobOutcome {
    #[must_use]
    pub fn identifier(&self) -> &Identifier {
        match self {
            JobOutcome::Completed { identifier, .. }
            | JobOutcome::Failed { identifier, .. }
            | JobOutcome::Cancelled { identifier } => identifier,
        }
    }

    #[must_use]
    pub fn storefronts(&self) -> &[StorefrontReport] {
        match self {
            JobOutcome::Completed { storefronts, .. } | JobOutcome::Failed { storefronts, .. } => {
                storefronts
            }
            JobOutcome::Cancelled { .. } => &[],
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }
}

/// Completed identifiers out of the run total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunProgress {
    pub completed: usize,
    pub total: usize,
}

impl RunProgress {
    /// Progress normalised to 0–100.
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = self.completed.min(self.total) * 100 / self.total;
        u8::try_from(pct).unwrap_or(100)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }
}

/// Structured events emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    JobStarted {
        identifier: Identifier,
    },
    ImageSaved {
        identifier: Identifier,
        storefront: Storefront,
        url: String,
        path: PathBuf,
    },
    DownloadFailed {
        identifier: Identifier,
        storefront: Storefront,
        url: String,
        reason: String,
    },
    NoImages {
        identifier: Identifier,
        storefront: Storefront,
    },
    StorefrontFailed {
        identifier: Identifier,
        storefront: Storefront,
        reason: String,
    },
    /// Marks the boundary between identifiers.
    JobFinished {
        identifier: Identifier,
        completed: bool,
    },
    Progress(RunProgress),
}

/// Receives [`PipelineEvent`]s; called from every worker.
pub type EventSink = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// An [`EventSink`] that discards everything.
#[must_use]
pub fn discard_events() -> EventSink {
    Arc::new(|_| {})
}

/// End-of-run report. `jobs` is in input order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub jobs: Vec<JobOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.is_completed()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j, JobOutcome::Failed { .. }))
            .count()
    }

    #[must_use]
    pub fn cancelled_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j, JobOutcome::Cancelled { .. }))
            .count()
    }

    /// (identifier, storefront) pairs where no images were discoverable.
    #[must_use]
    pub fn zero_image_storefronts(&self) -> Vec<(&Identifier, Storefront)> {
        self.jobs
            .iter()
            .flat_map(|job| {
                job.storefronts()
                    .iter()
                    .filter(|r| r.status == StorefrontStatus::NoImages)
                    .map(move |r| (job.identifier(), r.storefront))
            })
            .collect()
    }

    /// Every image that failed to download, with its identifier and storefront.
    #[must_use]
    pub fn download_failures(&self) -> Vec<(&Identifier, Storefront, &DownloadFailure)> {
        let mut out = Vec::new();
        for job in &self.jobs {
            for report in job.storefronts() {
                if let StorefrontStatus::Images { failed, .. } = &report.status {
                    out.extend(failed.iter().map(|f| (job.identifier(), report.storefront, f)));
                }
            }
        }
        out
    }
}
