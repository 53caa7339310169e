//! Core data models for the media manifest pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ScanError;

/// Processing category a file is sorted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Still images
    Photos,
    /// Regular-speed videos
    Videos,
    /// Videos recorded above the slow-motion frame-rate threshold
    Slowmo,
    /// Extension not in any known table; never written to a manifest
    Excluded,
}

impl Category {
    /// Categories that can produce a manifest, in write order
    pub const MANIFEST: [Category; 3] = [Category::Photos, Category::Videos, Category::Slowmo];

    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Photos => "photos",
            Category::Videos => "videos",
            Category::Slowmo => "slowmo",
            Category::Excluded => "excluded",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a format is native to the capture device or foreign to it.
///
/// Orthogonal to [`Category`]: decided by extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Native,
    Foreign,
}

/// A regular file found by the tree walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Full path to the file
    pub path: PathBuf,
    /// File extension (lowercase, with leading dot; empty if none)
    pub extension: String,
}

impl FileRecord {
    /// Build a record from a path, normalising its extension
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        Self { path, extension }
    }

    /// Path as a string, as stored in manifests
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Lowercased extension of `path` including the leading dot
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Checksum to paths mapping for one category.
///
/// Every path listed under a checksum has byte-identical content. Paths keep
/// the order in which they were aggregated; index 0 is the representative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ChecksumMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` under `checksum`.
    ///
    /// Returns true if `path` is the first one seen for this checksum.
    pub fn insert(&mut self, checksum: impl Into<String>, path: impl Into<String>) -> bool {
        let paths = self.entries.entry(checksum.into()).or_default();
        paths.push(path.into());
        paths.len() == 1
    }

    /// Number of distinct checksums
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of paths across all checksums
    pub fn path_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Paths beyond the first under each checksum
    pub fn duplicate_count(&self) -> usize {
        self.path_count() - self.len()
    }

    /// First-listed path for every checksum
    pub fn representatives(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(sum, paths)| paths.first().map(|p| (sum.as_str(), p.as_str())))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.entries.iter()
    }
}

/// Progress snapshot emitted after each file completes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of files processed so far
    pub processed: u64,
    /// Number of files found by the walk
    pub total: u64,
    /// Path of the file that just completed
    pub current_path: String,
    /// Elapsed time in milliseconds
    pub elapsed_ms: u64,
}

impl ScanProgress {
    /// Percentage of files processed
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }

    /// Calculate estimated remaining time from the average rate so far
    pub fn estimated_remaining_ms(&self) -> Option<u64> {
        if self.processed == 0 || self.elapsed_ms == 0 {
            return None;
        }
        let rate = self.processed as f64 / self.elapsed_ms as f64;
        let remaining = self.total.saturating_sub(self.processed);
        Some((remaining as f64 / rate) as u64)
    }
}

/// Result of a scan operation
#[derive(Debug, Default, Serialize)]
pub struct ScanOutcome {
    /// Timestamp that scopes this scan's manifests
    pub scan_timestamp: String,
    /// Total number of regular files found
    pub total_files: u64,
    /// Files written into a checksum map
    pub admitted_files: u64,
    /// Files whose extension is in no known table
    pub unclassified_files: u64,
    /// Files dropped by the inclusion policy
    pub filtered_files: u64,
    /// Files that could not be hashed or whose worker was lost
    pub failed_files: u64,
    /// Entries the walk could not descend into
    pub walk_errors: u64,
    /// Admitted paths that duplicate an earlier admitted path
    pub duplicate_files: u64,
    /// Aggregated checksum maps per category
    pub maps: BTreeMap<Category, ChecksumMap>,
    /// Written manifest locations per category
    pub manifests: BTreeMap<Category, PathBuf>,
    /// Categories whose manifest could not be written
    #[serde(skip)]
    pub manifest_failures: Vec<(Category, ScanError)>,
    /// Per-file errors encountered during scanning
    #[serde(skip)]
    pub errors: Vec<ScanError>,
    /// Total scan duration in milliseconds
    pub duration_ms: u64,
}

impl ScanOutcome {
    /// Checksum map for a category, if any file was admitted to it
    pub fn map(&self, category: Category) -> Option<&ChecksumMap> {
        self.maps.get(&category)
    }

    /// Count summary of everything that went wrong
    pub fn failure_summary(&self) -> FailureSummary {
        FailureSummary {
            failed_files: self.failed_files,
            walk_errors: self.walk_errors,
            failed_manifests: self.manifest_failures.iter().map(|(c, _)| *c).collect(),
        }
    }

    /// Check if the scan completed without errors
    pub fn is_success(&self) -> bool {
        self.failed_files == 0
            && self.walk_errors == 0
            && self.errors.is_empty()
            && self.manifest_failures.is_empty()
    }
}

/// Failure counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    /// Files excluded because they could not be hashed
    pub failed_files: u64,
    /// Entries the walk could not descend into
    pub walk_errors: u64,
    /// Categories whose manifest was not written
    pub failed_manifests: Vec<Category>,
}

impl std::fmt::Display for FailureSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) failed, {} walk error(s), {} manifest(s) failed",
            self.failed_files,
            self.walk_errors,
            self.failed_manifests.len()
        )?;
        if !self.failed_manifests.is_empty() {
            let names: Vec<&str> = self.failed_manifests.iter().map(Category::as_str).collect();
            write!(f, " ({})", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_record_extension() {
        let record = FileRecord::from_path("/media/IMG_0001.HEIC");
        assert_eq!(record.extension, ".heic");

        let record = FileRecord::from_path("/media/README");
        assert_eq!(record.extension, "");

        let record = FileRecord::from_path("/media/clip.tar.MP4");
        assert_eq!(record.extension, ".mp4");
    }

    #[test]
    fn test_checksum_map_insert_keeps_order() {
        let mut map = ChecksumMap::new();
        assert!(map.insert("aa", "/one"));
        assert!(!map.insert("aa", "/two"));
        assert!(map.insert("bb", "/three"));

        assert_eq!(map.len(), 2);
        assert_eq!(map.path_count(), 3);
        assert_eq!(map.duplicate_count(), 1);
        let (_, paths) = map.iter().next().unwrap();
        assert_eq!(paths, &vec!["/one".to_string(), "/two".to_string()]);

        let reps: Vec<_> = map.representatives().collect();
        assert_eq!(reps, vec![("aa", "/one"), ("bb", "/three")]);
    }

    #[test]
    fn test_checksum_map_serializes_as_object_of_arrays() {
        let mut map = ChecksumMap::new();
        map.insert("d41d8cd98f00b204e9800998ecf8427e", "/a.heic");
        map.insert("d41d8cd98f00b204e9800998ecf8427e", "/b.heic");

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"d41d8cd98f00b204e9800998ecf8427e": ["/a.heic", "/b.heic"]})
        );
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&Category::Slowmo).unwrap(), "\"slowmo\"");
        assert_eq!(Category::Photos.to_string(), "photos");
        assert!(!Category::MANIFEST.contains(&Category::Excluded));
    }

    #[test]
    fn test_scan_progress_estimated_remaining() {
        let progress = ScanProgress {
            processed: 100,
            total: 1000,
            current_path: "/test".to_string(),
            elapsed_ms: 1000,
        };

        // 100 files in 1000ms = 0.1 files/ms
        // 900 remaining files / 0.1 = 9000ms
        assert_eq!(progress.estimated_remaining_ms(), Some(9000));
        assert!((progress.percent() - 10.0).abs() < f64::EPSILON);
        assert_eq!(ScanProgress::default().estimated_remaining_ms(), None);
    }

    #[test]
    fn test_failure_summary_display() {
        let outcome = ScanOutcome {
            failed_files: 2,
            errors: vec![
                ScanError::lost(PathBuf::from("/a")),
                ScanError::lost(PathBuf::from("/b")),
            ],
            manifest_failures: vec![(
                Category::Videos,
                ScanError::manifest_write(PathBuf::from("/m"), "disk full"),
            )],
            ..Default::default()
        };
        let summary = outcome.failure_summary();
        assert_eq!(summary.walk_errors, 0);
        assert_eq!(
            summary.to_string(),
            "2 file(s) failed, 0 walk error(s), 1 manifest(s) failed (videos)"
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_failed_files_alone_is_not_success() {
        let outcome = ScanOutcome {
            failed_files: 1,
            ..Default::default()
        };
        assert!(!outcome.is_success());
        assert!(ScanOutcome::default().is_success());
    }
}
