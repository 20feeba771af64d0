//! Per-identifier fetch → extract → download cycle across storefronts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use asinpix_core::{Identifier, Storefront};

use crate::download::ImageDownloader;
use crate::error::FetchError;
use crate::extract::ImageUrlExtractor;
use crate::fetcher::{FetchSession, PageFetcher};
use crate::types::{
    DownloadFailure, DownloadOutcome, EventSink, JobOutcome, PipelineEvent, StorefrontReport,
    StorefrontStatus,
};

/// Collaborators shared by every job in a run.
pub struct JobContext {
    pub fetcher: Arc<dyn PageFetcher>,
    pub extractor: Arc<dyn ImageUrlExtractor>,
    pub downloader: ImageDownloader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Starting,
    Fetching(Storefront),
    Extracting,
    Downloading,
    Done,
    Aborted,
}

impl JobState {
    /// Whether `self → next` is a legal step.
    ///
    /// Per-storefront failures move on to the next `Fetching` (or `Done`).
    /// A session that cannot be opened or is lost mid-fetch aborts from
    /// `Starting` or `Fetching`; a session that fails to close aborts from
    /// whichever state the last storefront ended in.
    #[must_use]
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::{Aborted, Done, Downloading, Extracting, Fetching, Starting};
        matches!(
            (self, next),
            (
                Starting | Fetching(_) | Extracting | Downloading,
                Fetching(_) | Done | Aborted
            ) | (Fetching(_), Extracting)
                | (Extracting, Downloading)
        )
    }
}

/// Output file for the `index`-th (1-based) image of `identifier`.
#[must_use]
pub fn image_file_name(identifier: &Identifier, index: usize) -> String {
    format!("{identifier}_{index}.jpg")
}

/// One identifier's pass over every selected storefront, using a single
/// fetch session that is released on every exit path.
pub struct IdentifierJob {
    identifier: Identifier,
    storefronts: Arc<[Storefront]>,
    base_dir: Arc<Path>,
    ctx: Arc<JobContext>,
    events: EventSink,
    state: JobState,
}

impl IdentifierJob {
    #[must_use]
    pub fn new(
        identifier: Identifier,
        storefronts: Arc<[Storefront]>,
        base_dir: Arc<Path>,
        ctx: Arc<JobContext>,
        events: EventSink,
    ) -> Self {
        Self {
            identifier,
            storefronts,
            base_dir,
            ctx,
            events,
            state: JobState::Starting,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal job transition {:?} -> {next:?}",
            self.state
        );
        tracing::trace!(identifier = %self.identifier, from = ?self.state, to = ?next, "job state");
        self.state = next;
    }

    fn emit(&self, event: &PipelineEvent) {
        (self.events)(event);
    }

    pub async fn run(mut self) -> JobOutcome {
        tracing::info!(identifier = %self.identifier, "processing identifier");
        self.emit(&PipelineEvent::JobStarted {
            identifier: self.identifier.clone(),
        });

        let mut session = match self.ctx.fetcher.open_session().await {
            Ok(session) => session,
            Err(e) => {
                self.transition(JobState::Aborted);
                tracing::error!(identifier = %self.identifier, error = %e, "could not open fetch session");
                return self.finish(JobOutcome::Failed {
                    identifier: self.identifier.clone(),
                    cause: e.to_string(),
                    storefronts: Vec::new(),
                });
            }
        };

        let mut reports = Vec::with_capacity(self.storefronts.len());
        let lost = self.visit_storefronts(session.as_mut(), &mut reports).await;
        let closed = session.close().await;

        let outcome = match (lost, closed) {
            (None, Ok(())) => {
                self.transition(JobState::Done);
                JobOutcome::Completed {
                    identifier: self.identifier.clone(),
                    storefronts: reports,
                }
            }
            (Some(e), _) => {
                self.transition(JobState::Aborted);
                tracing::error!(identifier = %self.identifier, error = %e, "fetch session lost");
                JobOutcome::Failed {
                    identifier: self.identifier.clone(),
                    cause: e.to_string(),
                    storefronts: reports,
                }
            }
            (None, Err(e)) => {
                self.transition(JobState::Aborted);
                tracing::error!(identifier = %self.identifier, error = %e, "could not close fetch session");
                JobOutcome::Failed {
                    identifier: self.identifier.clone(),
                    cause: e.to_string(),
                    storefronts: reports,
                }
            }
        };
        self.finish(outcome)
    }

    fn finish(&self, outcome: JobOutcome) -> JobOutcome {
        self.emit(&PipelineEvent::JobFinished {
            identifier: self.identifier.clone(),
            completed: outcome.is_completed(),
        });
        outcome
    }

    /// Returns the error that killed the session, if any.
    async fn visit_storefronts(
        &mut self,
        session: &mut dyn FetchSession,
        reports: &mut Vec<StorefrontReport>,
    ) -> Option<FetchError> {
        let storefronts = Arc::clone(&self.storefronts);
        for &storefront in storefronts.iter() {
            self.transition(JobState::Fetching(storefront));
            let url = storefront.product_url(&self.identifier);

            let html = match session.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!(
                        identifier = %self.identifier,
                        storefront = storefront.domain_suffix,
                        error = %e,
                        "page fetch failed"
                    );
                    self.emit(&PipelineEvent::StorefrontFailed {
                        identifier: self.identifier.clone(),
                        storefront,
                        reason: e.to_string(),
                    });
                    reports.push(StorefrontReport {
                        storefront,
                        status: StorefrontStatus::FetchFailed {
                            reason: e.to_string(),
                        },
                    });
                    if e.is_session_lost() {
                        return Some(e);
                    }
                    continue;
                }
            };

            self.transition(JobState::Extracting);
            let urls = self.ctx.extractor.extract(&html);
            let status = self.save_images(storefront, &urls).await;
            reports.push(StorefrontReport { storefront, status });
        }
        None
    }

    async fn save_images(&mut self, storefront: Storefront, urls: &[String]) -> StorefrontStatus {
        let dir: PathBuf = self.base_dir.join(storefront.output_dir_name());
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::warn!(
                identifier = %self.identifier,
                dir = %dir.display(),
                error = %e,
                "could not create output directory"
            );
            let reason = format!("failed to create {}: {e}", dir.display());
            self.emit(&PipelineEvent::StorefrontFailed {
                identifier: self.identifier.clone(),
                storefront,
                reason: reason.clone(),
            });
            return StorefrontStatus::OutputFailed { reason };
        }

        if urls.is_empty() {
            tracing::info!(
                identifier = %self.identifier,
                storefront = storefront.domain_suffix,
                "no images found"
            );
            self.emit(&PipelineEvent::NoImages {
                identifier: self.identifier.clone(),
                storefront,
            });
            return StorefrontStatus::NoImages;
        }

        self.transition(JobState::Downloading);
        let mut saved = Vec::new();
        let mut failed = Vec::new();

        for (i, url) in urls.iter().enumerate() {
            let index = i + 1;
            let path = dir.join(image_file_name(&self.identifier, index));
            match self.ctx.downloader.download(url, &path).await {
                DownloadOutcome::Saved { path, bytes } => {
                    tracing::info!(
                        identifier = %self.identifier,
                        storefront = storefront.domain_suffix,
                        url = %url,
                        bytes,
                        "saved image"
                    );
                    self.emit(&PipelineEvent::ImageSaved {
                        identifier: self.identifier.clone(),
                        storefront,
                        url: url.clone(),
                        path: path.clone(),
                    });
                    saved.push(path);
                }
                DownloadOutcome::Failed { url, reason } => {
                    tracing::warn!(
                        identifier = %self.identifier,
                        storefront = storefront.domain_suffix,
                        url = %url,
                        error = %reason,
                        "image download failed"
                    );
                    self.emit(&PipelineEvent::DownloadFailed {
                        identifier: self.identifier.clone(),
                        storefront,
                        url: url.clone(),
                        reason: reason.clone(),
                    });
                    failed.push(DownloadFailure { index, url, reason });
                }
            }
        }

        StorefrontStatus::Images { saved, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn com() -> Storefront {
        Storefront::lookup("com").unwrap()
    }

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            JobState::Starting,
            JobState::Fetching(com()),
            JobState::Extracting,
            JobState::Downloading,
            JobState::Fetching(com()),
            JobState::Extracting,
            JobState::Done,
        ];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn failed_fetch_moves_to_next_storefront() {
        assert!(JobState::Fetching(com()).can_transition_to(JobState::Fetching(com())));
        assert!(JobState::Fetching(com()).can_transition_to(JobState::Done));
    }

    #[test]
    fn every_active_state_can_abort() {
        for from in [
            JobState::Starting,
            JobState::Fetching(com()),
            JobState::Extracting,
            JobState::Downloading,
        ] {
            assert!(from.can_transition_to(JobState::Aborted), "{from:?}");
        }
        assert!(!JobState::Done.can_transition_to(JobState::Aborted));
    }

    #[test]
    fn terminal_states_are_final() {
        for next in [JobState::Starting, JobState::Fetching(com()), JobState::Done] {
            assert!(!JobState::Done.can_transition_to(next));
            assert!(!JobState::Aborted.can_transition_to(next));
        }
    }

    #[test]
    fn download_requires_extraction_first() {
        assert!(!JobState::Fetching(com()).can_transition_to(JobState::Downloading));
        assert!(!JobState::Starting.can_transition_to(JobState::Extracting));
    }

    #[test]
    fn image_file_name_is_one_based() {
        let id = Identifier::parse("B001").unwrap();
        assert_eq!(image_file_name(&id, 1), "B001_1.jpg");
        assert_eq!(image_file_name(&id, 12), "B001_12.jpg");
    }
}
