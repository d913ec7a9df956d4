//! Structured events emitted while processing an archive.
//!
//! Batch and per-entry diagnostics go to the `app.system` target, one record
//! per successful write goes to `audit`. Every event carries the request's
//! `trace_id` and the `archive` it belongs to.

use crate::services::extraction::ExtractionReport;
use crate::services::registry::StorageClass;
use crate::services::trace::TraceToken;
use std::path::Path;
use tracing::{debug, info, warn};

pub fn batch_started(trace: &TraceToken, archive: &str) {
    info!(
        target: "app.system",
        trace_id = %trace,
        archive = %archive,
        "Started processing archive"
    );
}

pub fn batch_finished(trace: &TraceToken, report: &ExtractionReport) {
    info!(
        target: "app.system",
        trace_id = %trace,
        archive = %report.archive,
        written = report.written(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Finished processing archive"
    );
}

pub fn entry_classified(
    trace: &TraceToken,
    archive: &str,
    filename: &str,
    key: &str,
    class: StorageClass,
) {
    debug!(
        target: "app.system",
        trace_id = %trace,
        archive = %archive,
        filename = %filename,
        extension = %key,
        strategy = %class,
        "Classified entry"
    );
}

pub fn entry_skipped(trace: &TraceToken, archive: &str, entry: &str, reason: &str) {
    debug!(
        target: "app.system",
        trace_id = %trace,
        archive = %archive,
        entry = %entry,
        reason = %reason,
        "Skipped entry"
    );
}

pub fn entry_failed(trace: &TraceToken, archive: &str, entry: &str, reason: &str) {
    warn!(
        target: "app.system",
        trace_id = %trace,
        archive = %archive,
        entry = %entry,
        reason = %reason,
        "Entry failed"
    );
}

pub fn entry_written(
    trace: &TraceToken,
    archive: &str,
    filename: &str,
    destination: &Path,
    bytes: u64,
) {
    info!(
        target: "audit",
        trace_id = %trace,
        archive = %archive,
        filename = %filename,
        destination = %destination.display(),
        bytes = bytes,
        "File stored"
    );
}
