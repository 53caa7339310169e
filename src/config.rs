//! Configuration for the media manifest scanner

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ScanError;
use crate::models::{Category, Origin};

/// Default number of hashing workers
pub const DEFAULT_NUM_WORKERS: usize = 3;

/// Default read size for content hashing (8 KB)
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Frame rate above which a video counts as slow-motion
pub const DEFAULT_SLOWMO_FPS_THRESHOLD: f64 = 100.0;

/// Default frame-rate probe executable
pub const DEFAULT_PROBE_PROGRAM: &str = "ffprobe";

/// Default minimum interval between progress messages
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 200;

/// Inclusion flags for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Whether the category is scanned into a manifest at all
    pub include: bool,
    /// Whether foreign formats are admitted alongside native ones
    pub include_non_native: bool,
}

impl CategoryPolicy {
    pub const fn new(include: bool, include_non_native: bool) -> Self {
        Self {
            include,
            include_non_native,
        }
    }

    /// Check if a file of this origin passes the flags
    pub fn admits(&self, origin: Origin) -> bool {
        self.include && (origin == Origin::Native || self.include_non_native)
    }
}

/// Per-category inclusion flags, fixed for the duration of a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InclusionPolicy {
    pub photos: CategoryPolicy,
    pub videos: CategoryPolicy,
    pub slowmo: CategoryPolicy,
}

impl InclusionPolicy {
    /// Include every category and every format
    pub const fn all() -> Self {
        let policy = CategoryPolicy::new(true, true);
        Self {
            photos: policy,
            videos: policy,
            slowmo: policy,
        }
    }

    /// Include every category, native formats only
    pub const fn native_only() -> Self {
        let policy = CategoryPolicy::new(true, false);
        Self {
            photos: policy,
            videos: policy,
            slowmo: policy,
        }
    }

    /// Include nothing
    pub const fn none() -> Self {
        let policy = CategoryPolicy::new(false, false);
        Self {
            photos: policy,
            videos: policy,
            slowmo: policy,
        }
    }

    /// Flags for a category; `Excluded` never admits anything
    pub fn for_category(&self, category: Category) -> CategoryPolicy {
        match category {
            Category::Photos => self.photos,
            Category::Videos => self.videos,
            Category::Slowmo => self.slowmo,
            Category::Excluded => CategoryPolicy::default(),
        }
    }

    /// Replace the flags for a category
    pub fn with_category(mut self, category: Category, policy: CategoryPolicy) -> Self {
        match category {
            Category::Photos => self.photos = policy,
            Category::Videos => self.videos = policy,
            Category::Slowmo => self.slowmo = policy,
            Category::Excluded => {}
        }
        self
    }

    /// Check if a classified file passes the policy
    pub fn admits(&self, category: Category, origin: Origin) -> bool {
        self.for_category(category).admits(origin)
    }

    /// Check if a category produces a manifest at all
    pub fn includes(&self, category: Category) -> bool {
        self.for_category(category).include
    }

    /// Check if at least one category is included
    pub fn any_included(&self) -> bool {
        Category::MANIFEST.iter().any(|c| self.includes(*c))
    }
}

/// Configuration for a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root directory to scan recursively
    pub source_dir: PathBuf,

    /// Directory under which `data/<timestamp>/` manifests are written
    pub manifest_dir: PathBuf,

    /// Which categories and formats are admitted
    pub policy: InclusionPolicy,

    /// Number of hashing workers
    /// 0 means auto-detect
    pub num_workers: usize,

    /// Read size for content hashing (bytes)
    pub chunk_size: usize,

    /// Frame rate strictly above which a video is slow-motion
    pub slowmo_fps_threshold: f64,

    /// Frame-rate probe executable
    pub probe_program: String,

    /// Whether to emit progress messages on stderr
    pub show_progress: bool,

    /// Minimum interval between progress messages
    pub progress_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            manifest_dir: PathBuf::new(),
            policy: InclusionPolicy::all(),
            num_workers: DEFAULT_NUM_WORKERS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            slowmo_fps_threshold: DEFAULT_SLOWMO_FPS_THRESHOLD,
            probe_program: DEFAULT_PROBE_PROGRAM.to_string(),
            show_progress: false,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
        }
    }
}

impl ScanConfig {
    /// Create a new config for the given source and manifest directories
    pub fn new(source_dir: PathBuf, manifest_dir: PathBuf) -> Self {
        Self {
            source_dir,
            manifest_dir,
            ..Default::default()
        }
    }

    /// Create a config builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }

    /// Get the effective number of workers
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(DEFAULT_NUM_WORKERS)
        } else {
            self.num_workers
        }
    }

    /// Reject configurations that cannot produce a meaningful scan.
    ///
    /// Run once before scanning; the scan itself trusts these values.
    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.source_dir.is_dir() {
            return Err(ScanError::invalid_config(format!(
                "source is not a directory: {}",
                self.source_dir.display()
            )));
        }
        if self.manifest_dir.as_os_str().is_empty() {
            return Err(ScanError::invalid_config("manifest directory is empty"));
        }
        if self.manifest_dir.exists() && !self.manifest_dir.is_dir() {
            return Err(ScanError::invalid_config(format!(
                "manifest location is not a directory: {}",
                self.manifest_dir.display()
            )));
        }
        self.validate_settings()
    }

    /// Check the non-path settings
    pub fn validate_settings(&self) -> Result<(), ScanError> {
        if self.chunk_size == 0 {
            return Err(ScanError::invalid_config("chunk size must be positive"));
        }
        if !self.slowmo_fps_threshold.is_finite() || self.slowmo_fps_threshold <= 0.0 {
            return Err(ScanError::invalid_config(format!(
                "invalid slow-motion threshold: {}",
                self.slowmo_fps_threshold
            )));
        }
        if self.probe_program.trim().is_empty() {
            return Err(ScanError::invalid_config("probe program is empty"));
        }
        if !self.policy.any_included() {
            return Err(ScanError::invalid_config("no category is included"));
        }
        Ok(())
    }
}

/// Builder for ScanConfig
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source directory
    pub fn source_dir(mut self, dir: PathBuf) -> Self {
        self.config.source_dir = dir;
        self
    }

    /// Set the manifest directory
    pub fn manifest_dir(mut self, dir: PathBuf) -> Self {
        self.config.manifest_dir = dir;
        self
    }

    /// Set the inclusion policy
    pub fn policy(mut self, policy: InclusionPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set the number of hashing workers
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the hashing read size
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the slow-motion threshold
    pub fn slowmo_fps_threshold(mut self, fps: f64) -> Self {
        self.config.slowmo_fps_threshold = fps;
        self
    }

    /// Set the probe executable
    pub fn probe_program(mut self, program: impl Into<String>) -> Self {
        self.config.probe_program = program.into();
        self
    }

    /// Enable or disable progress output
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.config.show_progress = enabled;
        self
    }

    /// Set the progress interval
    pub fn progress_interval_ms(mut self, interval: u64) -> Self {
        self.config.progress_interval_ms = interval;
        self
    }

    /// Build the config
    pub fn build(self) -> ScanConfig {
        self.config
    }
}
