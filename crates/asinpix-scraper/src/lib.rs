pub mod download;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod job;
mod retry;
pub mod scheduler;
pub mod types;

pub use download::ImageDownloader;
pub use error::{DownloadError, FetchError, SessionError};
pub use extract::{ColorImagesExtractor, ImageCandidate, ImageUrlExtractor, JsonGalleryExtractor};
#[cfg(feature = "chromium")]
pub use fetcher::{ChromiumFetcher, ChromiumOptions};
pub use fetcher::{FetchSession, PageFetcher};
pub use job::{image_file_name, IdentifierJob, JobContext, JobState};
pub use scheduler::{PipelineScheduler, StopSignal};
pub use types::{
    discard_events, DownloadFailure, DownloadOutcome, EventSink, JobOutcome, PipelineEvent,
    RunProgress, RunSummary, StorefrontReport, StorefrontStatus,
};
