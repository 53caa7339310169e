//! Progress reporting module for scan operations
//!
//! The scanner emits events through [`ScanObserver`]; aggregation never
//! depends on them. [`ProgressReporter`] renders the events as JSON lines on
//! stderr for external callers.

use serde::Serialize;
use std::cell::Cell;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::error::ScanError;
use crate::models::{ScanOutcome, ScanProgress};

/// Receives scan events on the coordinating thread
pub trait ScanObserver {
    /// The walk finished and `total` files will be processed
    fn on_start(&self, _source: &Path, _total: u64) {}

    /// One more file finished hashing and aggregation
    fn on_progress(&self, _progress: &ScanProgress) {}

    /// The scan moved into a new phase
    fn on_phase(&self, _phase: ScanPhase) {}

    /// A per-file or per-manifest failure was recovered from
    fn on_error(&self, _error: &ScanError) {}

    /// All manifests have been written
    fn on_done(&self, _outcome: &ScanOutcome) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Scan phase indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanPhase {
    /// Walking the source tree
    #[default]
    Walk,
    /// Hashing and classifying files
    Hash,
    /// Writing per-category manifests
    Write,
    /// Scan completed and manifests written
    Done,
}

impl ScanPhase {
    /// Get string representation of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPhase::Walk => "walk",
            ScanPhase::Hash => "hash",
            ScanPhase::Write => "write",
            ScanPhase::Done => "done",
        }
    }
}

/// Start message sent once the walk has counted the files
#[derive(Debug, Clone, Serialize)]
pub struct StartMessage {
    /// Message type identifier
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Source directory being scanned
    pub source: String,
    /// Number of files to process
    pub total: u64,
}

impl StartMessage {
    /// Create a new start message
    pub fn new(seq: u64, ts: u64, source: String, total: u64) -> Self {
        Self {
            msg_type: "start",
            seq,
            ts,
            source,
            total,
        }
    }
}

/// Phase message sent when the scan enters a new phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseMessage {
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    pub seq: u64,
    pub ts: u64,
    pub phase: ScanPhase,
}

impl PhaseMessage {
    pub fn new(seq: u64, ts: u64, phase: ScanPhase) -> Self {
        Self {
            msg_type: "phase",
            seq,
            ts,
            phase,
        }
    }
}

/// Progress message sent as files complete
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMessage {
    /// Message type identifier ("p" for progress)
    #[serde(rename = "_t")]
    pub msg_type: &'static str,
    /// Sequence number
    pub seq: u64,
    /// Timestamp in milliseconds since reporter creation
    pub ts: u64,
    /// Current scan phase
    pub phase: ScanPhase,
    /// Number of files processed
    #[serde(rename = "f")]
    pub processed: u64,
    /// Number of files in total
    #[serde(rename = "n")]
    pub total: u64,
    /// Percentage processed
    pub pct: f64,
    /// Path of the last completed file
    pub path: String,
    /// Elapsed time in milliseconds
    pub ms: u64,
    /// Estimated remaining time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_ms: Option<u64>,
}

impl ProgressMessage {
    /// Create a progress message from a snapshot
    pub fn from_progress(seq: u64, ts: u64, progress: &ScanProgress) -> Self {
        Self {
            msg_type: "p",
            seq,
            ts,
            phase: ScanPhase::Hash,
            processed: progress.processed,
            total: progress.total,
            pct: (progress.percent() * 10.0).round() / 10.0,
            path: progress.current_path.clone(),
            ms: progress.elapsed_ms,
            eta_ms: progress.estimated_remaining_ms(),
        }
    }
}

/// Error message sent when a failure is recovered from
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
    pub error_type: String,
    /// Error message description
    pub message: String,
    /// Path that caused the error (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ErrorProgressMessage {
    /// Create a new error progress message
    pub fn new(seq: u64, ts: u64, error: &ScanError) -> Self {
        Self {
            msg_type: "err",
            seq,
            ts,
            error_type: format!("{:?}", error.kind),
            message: error.message.clone(),
            path: error.path.as_ref().map(|p| p.to_string_lossy().to_string()),
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
    /// Total number of files found
    #[serde(rename = "tf")]
    pub total_files: u64,
    /// Files admitted into a manifest
    #[serde(rename = "af")]
    pub admitted_files: u64,
    /// Admitted duplicates
    #[serde(rename = "df")]
    pub duplicate_files: u64,
    /// Files that could not be hashed
    #[serde(rename = "ff")]
    pub failed_files: u64,
    /// Number of manifests written
    #[serde(rename = "mc")]
    pub manifest_count: usize,
    /// Number of errors encountered
    #[serde(rename = "ec")]
    pub error_count: usize,
    /// Total scan duration in milliseconds
    pub ms: u64,
}

impl DoneMessage {
    /// Create a done message from a finished scan
    pub fn from_outcome(seq: u64, ts: u64, outcome: &ScanOutcome) -> Self {
        Self {
            msg_type: "done",
            seq,
            ts,
            total_files: outcome.total_files,
            admitted_files: outcome.admitted_files,
            duplicate_files: outcome.duplicate_files,
            failed_files: outcome.failed_files,
            manifest_count: outcome.manifests.len(),
            error_count: outcome.errors.len() + outcome.manifest_failures.len(),
            ms: outcome.duration_ms,
        }
    }
}

/// Progress reporter for outputting scan progress to stderr
///
/// Progress messages are throttled to `interval_ms`, except the one for the
/// last file, which is always sent. Errors and lifecycle messages are never
/// throttled.
pub struct ProgressReporter {
    /// Whether progress reporting is enabled
    enabled: bool,
    /// Reporting interval in milliseconds
    interval_ms: u64,
    /// Last report time
    last_report: Cell<Option<Instant>>,
    /// Sequence number for messages
    seq: AtomicU64,
    /// Start time of the reporter
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new ProgressReporter
    ///
    /// # Arguments
    /// * `enabled` - Whether progress reporting is enabled
    /// * `interval_ms` - Minimum interval between progress messages in milliseconds
    pub fn new(enabled: bool, interval_ms: u64) -> Self {
        Self {
            enabled,
            interval_ms,
            last_report: Cell::new(None),
            seq: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Check if enough time has passed since the last report
    pub fn should_report(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_report.get() {
            Some(last) => last.elapsed().as_millis() as u64 >= self.interval_ms,
            None => true,
        }
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
            eprintln!("{}", json);
            std::io::stderr().flush().ok();
        }
    }

    /// Report scan progress
    ///
    /// Returns true if a message was actually sent.
    pub fn report_progress(&self, progress: &ScanProgress) -> bool {
        if !self.enabled {
            return false;
        }
        let last = progress.processed >= progress.total;
        if !last && !self.should_report() {
            return false;
        }

        let msg = ProgressMessage::from_progress(self.next_seq(), self.current_timestamp(), progress);
        self.output_to_stderr(&msg);
        self.last_report.set(Some(Instant::now()));
        true
    }

    /// Check if the reporter is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl ScanObserver for ProgressReporter {
    fn on_start(&self, source: &Path, total: u64) {
        if !self.enabled {
            return;
        }
        let msg = StartMessage::new(
            self.next_seq(),
            self.current_timestamp(),
            source.to_string_lossy().to_string(),
            total,
        );
        self.output_to_stderr(&msg);
    }

    fn on_phase(&self, phase: ScanPhase) {
        if !self.enabled {
            return;
        }
        let msg = PhaseMessage::new(self.next_seq(), self.current_timestamp(), phase);
        self.output_to_stderr(&msg);
    }

    fn on_progress(&self, progress: &ScanProgress) {
        self.report_progress(progress);
    }

    fn on_error(&self, error: &ScanError) {
        if !self.enabled {
            return;
        }
        let msg = ErrorProgressMessage::new(self.next_seq(), self.current_timestamp(), error);
        self.output_to_stderr(&msg);
    }

    fn on_done(&self, outcome: &ScanOutcome) {
        if !self.enabled {
            return;
        }
        let msg = DoneMessage::from_outcome(self.next_seq(), self.current_timestamp(), outcome);
        self.output_to_stderr(&msg);
    }
}
