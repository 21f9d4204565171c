//! Progress events for scan operations
//!
//! When enabled, a [`ProgressReporter`] writes one JSON object per line to
//! stderr: a `start` event, an `err` event per recoverable error and a final
//! `done` event. Workers report errors concurrently, so the reporter is
//! `Sync` and numbers events with an atomic sequence.

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::config::FilterConfig;
use crate::error::ScanError;
use crate::models::ScanSummary;

/// Start message sent when the scan begins
#[derive(Debug, Clone, Serialize)]
pub struct StartMessage {
    /// Message type identifier
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Scan root path
    pub root: String,
    /// Active filters, in evaluation order
    pub filters: Vec<&'static str>,
}

impl StartMessage {
    /// Create a new start message
    pub fn new(seq: u64, ts: u64, root: String, filters: Vec<&'static str>) -> Self {
        Self {
            msg_type: "start",
            seq,
            ts,
            root,
            filters,
        }
    }
}

/// Error message sent when a directory or file is skipped
#[derive(Debug, Clone, Serialize)]
pub struct ErrorProgressMessage {
    /// Message type identifier ("err" for error)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Error type/category
    pub error_type: &'static str,
    /// Error message description
    pub message: String,
    /// Path that caused the error (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorProgressMessage {
    /// Create a new error progress message
    pub fn new(
        seq: u64,
        ts: u64,
        error_type: &'static str,
        message: String,
        path: Option<String>,
    ) -> Self {
        Self {
            msg_type: "err",
            seq,
            ts,
            error_type,
            message,
            path,
        }
    }
}

/// Done message sent when the scan completes
#[derive(Debug, Clone, Serialize)]
pub struct DoneMessage {
    /// Message type identifier ("done" for completion)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Directories listed
    #[serde(rename = "td")]
    pub total_dirs: u64,
    /// Regular files evaluated
    #[serde(rename = "tf")]
    pub total_files: u64,
    /// Files that passed every filter
    #[serde(rename = "mf")]
    pub matched_files: u64,
    /// Matched lines
    #[serde(rename = "ml")]
    pub matched_lines: u64,
    /// Number of errors encountered
    #[serde(rename = "ec")]
    pub error_count: u64,
    /// Total scan duration in milliseconds
    pub ms: u64,
}

impl DoneMessage {
    /// Create a done message from the scan totals
    pub fn new(seq: u64, ts: u64, summary: &ScanSummary) -> Self {
        Self {
            msg_type: "done",
            seq,
            ts,
            total_dirs: summary.dirs_visited,
            total_files: summary.files_visited,
            matched_files: summary.files_matched,
            matched_lines: summary.lines_matched,
            error_count: summary.error_count(),
            ms: summary.duration_ms,
        }
    }
}

/// Progress reporter writing JSON events to stderr
pub struct ProgressReporter {
    /// Whether progress reporting is enabled
    enabled: bool,
    /// Sequence number for messages
    seq: AtomicU64,
    /// Start time of the reporter
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new ProgressReporter
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            seq: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Reporter that never writes anything
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Get the next sequence number (monotonically increasing)
    pub fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Get the current timestamp in milliseconds since reporter creation
    pub fn current_timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Output a serializable message to stderr as JSON
    pub fn output_to_stderr<T: Serialize>(&self, msg: &T) {
        if let Ok(json) = serde_json::to_string(msg) {
            let mut stderr = std::io::stderr().lock();
            writeln!(stderr, "{}", json).ok();
            stderr.flush().ok();
        }
    }

    /// Report scan start
    pub fn report_start(&self, root: &std::path::Path, filter: &FilterConfig) {
        if !self.enabled {
            return;
        }

        let msg = StartMessage::new(
            self.next_seq(),
            self.current_timestamp(),
            root.to_string_lossy().to_string(),
            active_filters(filter),
        );
        self.output_to_stderr(&msg);
    }

    /// Report a skipped directory or file
    pub fn report_error(&self, error: &ScanError) {
        if !self.enabled {
            return;
        }

        let msg = ErrorProgressMessage::new(
            self.next_seq(),
            self.current_timestamp(),
            error.kind.as_str(),
            error.message.clone(),
            error.path.as_ref().map(|p| p.to_string_lossy().to_string()),
        );
        self.output_to_stderr(&msg);
    }

    /// Report scan completion
    pub fn report_done(&self, summary: &ScanSummary) {
        if !self.enabled {
            return;
        }

        let msg = DoneMessage::new(self.next_seq(), self.current_timestamp(), summary);
        self.output_to_stderr(&msg);
    }

    /// Check if the reporter is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn active_filters(filter: &FilterConfig) -> Vec<&'static str> {
    let mut names = Vec::new();
    if filter.size_greater.is_some() {
        names.push("size-greater");
    }
    if filter.size_less.is_some() {
        names.push("size-less");
    }
    if filter.extensions.is_some() {
        names.push("extension");
    }
    if filter.name_substring.is_some() {
        names.push("name");
    }
    if filter.content_substring.is_some() {
        names.push("content");
    }
    names
}
