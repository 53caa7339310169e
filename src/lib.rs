//! Media ingest core: scans a directory tree, deduplicates files by content,
//! sorts them into photos, videos and slow-motion, and writes one JSON
//! manifest per category for the downstream converters.

pub mod classifier;
pub mod config;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod probe;
pub mod progress;
pub mod scanner;

pub use classifier::{Classification, Classifier};
pub use config::{CategoryPolicy, InclusionPolicy, ScanConfig};
pub use error::{ProbeError, ScanError, ScanErrorKind};
pub use manifest::{read_manifest, write_manifest};
pub use models::{Category, ChecksumMap, FailureSummary, FileRecord, Origin, ScanOutcome, ScanProgress};
pub use probe::{FfprobeProbe, FrameRateProbe};
pub use progress::{NoopObserver, ProgressReporter, ScanObserver, ScanPhase};
pub use scanner::{scan, scan_full, scan_with_timestamp};
