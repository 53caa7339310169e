//! Scanner module - walks the source tree, hashes files on a bounded worker
//! pool and aggregates the results into per-category checksum maps
//!
//! Workers only compute; they hand each result back over a channel and the
//! coordinating thread is the single writer of the checksum maps.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

use crate::classifier::{Classification, Classifier};
use crate::config::{InclusionPolicy, ScanConfig};
use crate::error::{ScanError, ScanErrorKind};
use crate::hasher::compute_checksum;
use crate::manifest::{scan_timestamp, write_manifests};
use crate::models::{Category, ChecksumMap, FileRecord, ScanOutcome, ScanProgress};
use crate::probe::FfprobeProbe;
use crate::progress::{ProgressReporter, ScanObserver, ScanPhase};

/// Files found under a source root
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Canonical source root
    pub root: PathBuf,
    /// Every regular file below the root
    pub files: Vec<FileRecord>,
    /// Subtrees that could not be read
    pub errors: Vec<ScanError>,
}

/// Recursively list every regular file under `source`.
///
/// Symlinks to files are listed under the link's own path; symlinked
/// directories are not descended into. Fails only if the root itself cannot be read; unreadable subdirectories are
/// collected as errors and skipped.
pub fn enumerate_files(source: &Path) -> Result<Enumeration, ScanError> {
    let root = fs::canonicalize(source)
        .map_err(|e| ScanError::enumeration(source.to_path_buf(), e.to_string()))?;
    if !root.is_dir() {
        return Err(ScanError::enumeration(root, "not a directory"));
    }
    fs::read_dir(&root).map_err(|e| ScanError::enumeration(root.clone(), e.to_string()))?;

    let mut enumeration = Enumeration {
        root: root.clone(),
        ..Default::default()
    };

    for entry in WalkDir::new(&root).follow_links(false) {
        match entry {
            Ok(entry) => {
                let is_file = entry.file_type().is_file()
                    || (entry.path_is_symlink() && entry.path().is_file());
                if is_file {
                    enumeration.files.push(FileRecord::from_path(entry.into_path()));
                }
            }
            Err(e) => {
                if e.depth() == 0 {
                    return Err(ScanError::enumeration(root, e.to_string()));
                }
                let path = e.path().map(|p| p.to_path_buf());
                let kind = if e.io_error().map(|e| e.kind())
                    == Some(std::io::ErrorKind::PermissionDenied)
                {
                    ScanErrorKind::PermissionDenied
                } else {
                    ScanErrorKind::Io
                };
                enumeration.errors.push(ScanError::new(kind, path, e.to_string()));
            }
        }
    }

    Ok(enumeration)
}

/// What a worker hands back for one file
#[derive(Debug)]
pub struct HashedFile {
    pub record: FileRecord,
    /// Checksum and classification, or why hashing failed
    pub result: Result<(String, Option<Classification>), ScanError>,
}

/// Hash a file, then classify it
pub fn process_file(record: FileRecord, classifier: &Classifier, chunk_size: usize) -> HashedFile {
    let result = compute_checksum(&record.path, chunk_size)
        .map(|checksum| (checksum, classifier.classify(&record.path)));
    HashedFile { record, result }
}

/// How the aggregator disposed of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Added to the category map; `duplicate` if its checksum was already there
    Admitted { category: Category, duplicate: bool },
    /// Extension in no known table
    Unclassified,
    /// Dropped by the inclusion policy
    Filtered(Category),
    /// Could not be hashed, or its worker never reported back
    Failed,
}

/// Coordinator-owned aggregation state
#[derive(Debug)]
pub struct Aggregator {
    policy: InclusionPolicy,
    maps: BTreeMap<Category, ChecksumMap>,
    admitted: u64,
    unclassified: u64,
    filtered: u64,
    failed: u64,
    walk_errors: u64,
    duplicates: u64,
    errors: Vec<ScanError>,
}

impl Aggregator {
    pub fn new(policy: InclusionPolicy) -> Self {
        Self {
            policy,
            maps: BTreeMap::new(),
            admitted: 0,
            unclassified: 0,
            filtered: 0,
            failed: 0,
            walk_errors: 0,
            duplicates: 0,
            errors: Vec::new(),
        }
    }

    /// Fold one worker result into the maps
    pub fn add(&mut self, file: HashedFile) -> Admission {
        let (checksum, classification) = match file.result {
            Ok(ok) => ok,
            Err(e) => {
                log::warn!("Skipping {}: {}", file.record.path.display(), e);
                self.failed += 1;
                self.errors.push(e);
                return Admission::Failed;
            }
        };

        let Some(Classification { category, origin }) = classification else {
            log::debug!("Unclassified: {}", file.record.path.display());
            self.unclassified += 1;
            return Admission::Unclassified;
        };

        if !self.policy.admits(category, origin) {
            log::debug!("Filtered out of {}: {}", category, file.record.path.display());
            self.filtered += 1;
            return Admission::Filtered(category);
        }

        let first = self
            .maps
            .entry(category)
            .or_default()
            .insert(checksum, file.record.path_string());
        self.admitted += 1;
        if !first {
            self.duplicates += 1;
        }
        Admission::Admitted {
            category,
            duplicate: !first,
        }
    }

    /// Record a subtree the walk could not read
    pub fn record_walk_error(&mut self, error: ScanError) {
        self.walk_errors += 1;
        self.errors.push(error);
    }

    /// Record a dispatched file whose worker never sent a result
    pub fn record_lost(&mut self, path: PathBuf) -> &ScanError {
        let error = ScanError::lost(path);
        log::error!("{}", error);
        self.failed += 1;
        self.errors.push(error);
        &self.errors[self.errors.len() - 1]
    }

    /// Checksum map for a category
    pub fn map(&self, category: Category) -> Option<&ChecksumMap> {
        self.maps.get(&category)
    }

    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }
}

/// Scan with ffprobe and JSON progress on stderr, as configured
pub fn scan_full(config: &ScanConfig, timestamp: &str) -> Result<ScanOutcome, ScanError> {
    let classifier = Classifier::new(
        Arc::new(FfprobeProbe::new(config.probe_program.clone())),
        config.slowmo_fps_threshold,
    );
    let reporter = ProgressReporter::new(config.show_progress, config.progress_interval_ms);
    scan_with_timestamp(config, classifier, &reporter, timestamp)
}

/// Scan with manifests scoped to the current time
pub fn scan(
    config: &ScanConfig,
    classifier: Classifier,
    observer: &dyn ScanObserver,
) -> Result<ScanOutcome, ScanError> {
    scan_with_timestamp(config, classifier, observer, &scan_timestamp())
}

/// Walk, hash, classify, aggregate and write manifests.
///
/// Only an unreadable source root (or an unusable configuration) fails the
/// scan. Per-file failures end up in [`ScanOutcome::errors`] and manifest
/// failures in [`ScanOutcome::manifest_failures`]. A file whose worker
/// panics is counted as failed, never silently dropped.
pub fn scan_with_timestamp(
    config: &ScanConfig,
    classifier: Classifier,
    observer: &dyn ScanObserver,
    timestamp: &str,
) -> Result<ScanOutcome, ScanError> {
    let start = Instant::now();

    log::info!("Scanning {}", config.source_dir.display());
    observer.on_phase(ScanPhase::Walk);
    let enumeration = enumerate_files(&config.source_dir)?;
    config.validate_settings()?;

    let total = enumeration.files.len() as u64;
    log::info!(
        "Found {} file(s) under {}, hashing with {} worker(s)",
        total,
        enumeration.root.display(),
        config.effective_workers()
    );
    observer.on_start(&enumeration.root, total);

    let mut aggregator = Aggregator::new(config.policy);
    for error in enumeration.errors {
        log::warn!("Walk error: {}", error);
        observer.on_error(&error);
        aggregator.record_walk_error(error);
    }
    observer.on_phase(ScanPhase::Hash);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_workers())
        .thread_name(|i| format!("hash-worker-{i}"))
        .panic_handler(|_| log::error!("Hash worker panicked; its file is skipped"))
        .build()?;

    let (tx, rx) = mpsc::channel::<HashedFile>();
    let mut pending: HashSet<PathBuf> = HashSet::with_capacity(enumeration.files.len());
    for record in enumeration.files {
        pending.insert(record.path.clone());
        let tx = tx.clone();
        let classifier = classifier.clone();
        let chunk_size = config.chunk_size;
        pool.spawn(move || {
            let hashed = process_file(record, &classifier, chunk_size);
            // the receiver outlives every worker
            let _ = tx.send(hashed);
        });
    }
    drop(tx);

    // drains until every worker has dropped its sender
    let mut processed = 0u64;
    for hashed in rx {
        processed += 1;
        pending.remove(&hashed.record.path);
        let current_path = hashed.record.path_string();
        let before = aggregator.errors().len();
        aggregator.add(hashed);
        if let Some(error) = aggregator.errors().get(before) {
            observer.on_error(error);
        }
        observer.on_progress(&ScanProgress {
            processed,
            total,
            current_path,
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    }

    let mut lost: Vec<PathBuf> = pending.into_iter().collect();
    lost.sort();
    for path in lost {
        observer.on_error(aggregator.record_lost(path));
    }

    log::info!("Scan complete. Writing manifests...");
    observer.on_phase(ScanPhase::Write);
    let manifests = write_manifests(
        &aggregator.maps,
        &config.manifest_dir,
        timestamp,
        &config.policy,
    );
    for (_, error) in &manifests.failures {
        observer.on_error(error);
    }

    let outcome = ScanOutcome {
        scan_timestamp: timestamp.to_string(),
        total_files: total,
        admitted_files: aggregator.admitted,
        unclassified_files: aggregator.unclassified,
        filtered_files: aggregator.filtered,
        failed_files: aggregator.failed,
        walk_errors: aggregator.walk_errors,
        duplicate_files: aggregator.duplicates,
        maps: aggregator.maps,
        manifests: manifests.written,
        manifest_failures: manifests.failures,
        errors: aggregator.errors,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "Admitted {} of {} file(s) ({} duplicate(s)); {}",
        outcome.admitted_files,
        outcome.total_files,
        outcome.duplicate_files,
        outcome.failure_summary()
    );
    observer.on_phase(ScanPhase::Done);
    observer.on_done(&outcome);

    Ok(outcome)
}
