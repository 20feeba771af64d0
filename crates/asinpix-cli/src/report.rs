//! Console rendering of pipeline events and the end-of-run summary.

use std::sync::Arc;

use asinpix_core::CATALOG;
use asinpix_scraper::{EventSink, JobOutcome, PipelineEvent, RunSummary, StorefrontStatus};

const SEPARATOR: &str = "----------------------------------------";

pub(crate) fn format_event(event: &PipelineEvent) -> String {
    match event {
        PipelineEvent::JobStarted { identifier } => format!("Processing ASIN: {identifier}"),
        PipelineEvent::ImageSaved { url, path, .. } => {
            format!("Saved image from {url} to {}", path.display())
        }
        PipelineEvent::DownloadFailed { url, reason, .. } => {
            format!("Failed to download {url}: {reason}")
        }
        PipelineEvent::NoImages {
            identifier,
            storefront,
        } => format!("No images found for {identifier} on {storefront}"),
        PipelineEvent::StorefrontFailed {
            identifier,
            storefront,
            reason,
        } => format!("Skipped {storefront} for {identifier}: {reason}"),
        PipelineEvent::JobFinished { .. } => SEPARATOR.to_string(),
        PipelineEvent::Progress(p) => {
            format!("[{:>3}%] {}/{} identifiers done", p.percent(), p.completed, p.total)
        }
    }
}

/// Prints each event as one line, on stderr when stdout is reserved for JSON.
pub(crate) fn console_events(to_stderr: bool) -> EventSink {
    Arc::new(move |event: &PipelineEvent| {
        let line = format_event(event);
        if to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    })
}

pub(crate) fn summary_lines(summary: &RunSummary) -> Vec<String> {
    let elapsed = (summary.finished_at - summary.started_at).num_milliseconds();
    #[allow(clippy::cast_precision_loss)]
    let secs = elapsed as f64 / 1000.0;

    let mut lines = vec![format!(
        "Finished {} identifiers in {secs:.1}s: {} completed, {} failed, {} cancelled",
        summary.total(),
        summary.completed_count(),
        summary.failed_count(),
        summary.cancelled_count()
    )];

    let failed: Vec<String> = summary
        .jobs
        .iter()
        .filter_map(|job| match job {
            JobOutcome::Failed {
                identifier, cause, ..
            } => Some(format!("  {identifier}: {cause}")),
            _ => None,
        })
        .collect();
    if !failed.is_empty() {
        lines.push("Failed identifiers:".to_string());
        lines.extend(failed);
    }

    let zero = summary.zero_image_storefronts();
    if !zero.is_empty() {
        lines.push("No images found:".to_string());
        lines.extend(
            zero.iter()
                .map(|(identifier, storefront)| format!("  {identifier} on {storefront}")),
        );
    }

    let skipped: Vec<String> = summary
        .jobs
        .iter()
        .flat_map(|job| {
            job.storefronts().iter().filter_map(move |r| match &r.status {
                StorefrontStatus::FetchFailed { reason } | StorefrontStatus::OutputFailed { reason } => {
                    Some(format!("  {} on {}: {reason}", job.identifier(), r.storefront))
                }
                _ => None,
            })
        })
        .collect();
    if !skipped.is_empty() {
        lines.push("Storefronts skipped:".to_string());
        lines.extend(skipped);
    }

    let failures = summary.download_failures();
    if !failures.is_empty() {
        lines.push("Download failures:".to_string());
        lines.extend(failures.iter().map(|(identifier, storefront, f)| {
            format!(
                "  {identifier} on {storefront} image {}: {} ({})",
                f.index, f.url, f.reason
            )
        }));
    }

    lines
}

pub(crate) fn catalog_lines() -> Vec<String> {
    CATALOG
        .iter()
        .map(|s| format!("{:<8} {:<16} {}", s.domain_suffix, s.label, s.locale))
        .collect()
}
