//! `download` command handler.
//!
//! Input problems (unreadable or malformed identifier file, unknown or empty
//! storefront selection, uncreatable output directory) are returned as errors
//! before any identifier is processed. Once the run starts, per-identifier
//! failures are reported in the summary and do not fail the command.

use std::path::PathBuf;
use std::sync::Arc;

use asinpix_core::{AppConfig, InputError, Storefront, CATALOG};
use asinpix_scraper::{
    ChromiumFetcher, ChromiumOptions, ColorImagesExtractor, ImageDownloader, ImageUrlExtractor,
    JsonGalleryExtractor, PipelineScheduler,
};

use crate::report;
use crate::ExtractorKind;

#[derive(Debug)]
pub(crate) struct DownloadArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub storefronts: Vec<String>,
    pub all_storefronts: bool,
    pub concurrency: Option<usize>,
    pub extractor: ExtractorKind,
    pub json: bool,
}

/// The whole catalog when `all` is set, otherwise `keys` resolved in order.
pub(crate) fn resolve_storefronts(keys: &[String], all: bool) -> Result<Vec<Storefront>, InputError> {
    if all {
        return Ok(CATALOG.to_vec());
    }
    Storefront::select(keys)
}

pub(crate) fn build_extractor(kind: ExtractorKind) -> Arc<dyn ImageUrlExtractor> {
    match kind {
        ExtractorKind::Regex => Arc::new(ColorImagesExtractor::new()),
        ExtractorKind::Json => Arc::new(JsonGalleryExtractor),
    }
}

pub(crate) async fn run_download(config: &AppConfig, args: DownloadArgs) -> anyhow::Result<()> {
    let list = asinpix_core::load_identifiers(&args.input)?;
    let storefronts = resolve_storefronts(&args.storefronts, args.all_storefronts)?;
    let max_jobs = args.concurrency.unwrap_or(config.max_concurrent_jobs);

    let downloader = ImageDownloader::new(
        config.download_timeout_secs,
        &config.user_agent,
        config.download_max_retries,
        config.retry_backoff_base_ms,
    )?;
    let fetcher = ChromiumFetcher::new(ChromiumOptions::from_config(config));
    let scheduler = PipelineScheduler::new(
        Arc::new(fetcher),
        build_extractor(args.extractor),
        downloader,
        max_jobs,
    );

    let stop = scheduler.stop_signal();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing identifiers already in progress");
            stop.stop();
        }
    });

    let events = report::console_events(args.json);
    let result = scheduler
        .run(&list.identifiers, &storefronts, &args.output, events)
        .await;
    interrupt.abort();
    let summary = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in report::summary_lines(&summary) {
            println!("{line}");
        }
    }
    Ok(())
}
