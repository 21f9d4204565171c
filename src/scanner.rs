//! Scanner module - wires configuration, walker and sink into one run

use std::sync::Arc;

use crate::config::{FilterConfig, ScanConfig};
use crate::error::Error;
use crate::filter::FilterPipeline;
use crate::models::ScanSummary;
use crate::progress::ProgressReporter;
use crate::sink::{self, Presenter};
use crate::walker::{WalkOptions, Walker};

/// Run a complete scan, rendering every result through `presenter`
///
/// Configuration is validated before anything touches the filesystem, so a
/// malformed size threshold produces no partial output.
pub fn scan<P: Presenter + ?Sized>(
    config: &ScanConfig,
    presenter: &mut P,
) -> Result<ScanSummary, Error> {
    let filter = FilterConfig::new(&config.filter)?;
    let root = config.resolve_root()?;

    let reporter = Arc::new(ProgressReporter::new(config.show_progress));
    reporter.report_start(&root, &filter);

    let walker = Walker::new(FilterPipeline::new(&filter), WalkOptions::from(config))
        .with_reporter(reporter.clone());
    let stream = walker.walk(&root)?;
    let summary = sink::drain(stream, presenter)?;

    reporter.report_done(&summary);
    log::info!(
        "scan finished: {} of {} files matched, {} dirs, {} errors, {}ms",
        summary.files_matched,
        summary.files_visited,
        summary.dirs_visited,
        summary.error_count(),
        summary.duration_ms
    );

    Ok(summary)
}
