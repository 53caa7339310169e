//! Manifest persistence
//!
//! A manifest is one category's [`ChecksumMap`] written as a JSON object of
//! arrays under `<manifest_dir>/data/<timestamp>/<category>_<timestamp>.json`.
//! Converters read it back with [`read_manifest`] and use the first path of
//! each checksum.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::InclusionPolicy;
use crate::error::ScanError;
use crate::models::{Category, ChecksumMap};

/// Format of the scan timestamp used in manifest and log paths
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Manifest file extension
pub const MANIFEST_EXTENSION: &str = "json";

/// Timestamp for a scan starting now
pub fn scan_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Directory holding every manifest of one scan
pub fn manifest_subdir(manifest_dir: &Path, timestamp: &str) -> PathBuf {
    manifest_dir.join("data").join(timestamp)
}

/// Location of one category's manifest
pub fn manifest_path(manifest_dir: &Path, category: Category, timestamp: &str) -> PathBuf {
    manifest_subdir(manifest_dir, timestamp).join(format!(
        "{}_{}.{}",
        category.as_str(),
        timestamp,
        MANIFEST_EXTENSION
    ))
}

/// Write a checksum map to `path`, creating parent directories.
///
/// The content goes to a temporary sibling first and is renamed into place
/// once fully flushed, so a failed write never leaves a truncated manifest.
pub fn write_manifest(map: &ChecksumMap, path: &Path) -> Result<PathBuf, ScanError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ScanError::manifest_write(
                path.to_path_buf(),
                format!("cannot create {}: {}", parent.display(), e),
            )
        })?;
    }

    let tmp_path = path.with_extension(format!("{MANIFEST_EXTENSION}.tmp"));
    if let Err(e) = write_json(map, &tmp_path).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(ScanError::manifest_write(path.to_path_buf(), e.to_string()));
    }

    Ok(path.to_path_buf())
}

fn write_json(map: &ChecksumMap, path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, map)?;
    writer.write_all(b"\n")?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Read a manifest back.
///
/// A missing file is `Ok(None)`: the category simply has no work.
pub fn read_manifest(path: &Path) -> Result<Option<ChecksumMap>, ScanError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ScanError::manifest_read(path.to_path_buf(), e.to_string())),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ScanError::manifest_read(path.to_path_buf(), e.to_string()))
}

/// Manifests written for one scan
#[derive(Debug, Default)]
pub struct ManifestSet {
    /// Written manifest per category
    pub written: BTreeMap<Category, PathBuf>,
    /// Categories that failed, each with its own error
    pub failures: Vec<(Category, ScanError)>,
}

/// Persist every included, non-empty category map.
///
/// A failure on one category does not stop the others.
pub fn write_manifests(
    maps: &BTreeMap<Category, ChecksumMap>,
    manifest_dir: &Path,
    timestamp: &str,
    policy: &InclusionPolicy,
) -> ManifestSet {
    let mut set = ManifestSet::default();

    for category in Category::MANIFEST {
        if !policy.includes(category) {
            continue;
        }
        let Some(map) = maps.get(&category).filter(|m| !m.is_empty()) else {
            log::info!("No {} admitted, skipping manifest", category);
            continue;
        };

        let path = manifest_path(manifest_dir, category, timestamp);
        match write_manifest(map, &path) {
            Ok(path) => {
                log::info!(
                    "Saved {} with {} unique file(s)",
                    path.display(),
                    map.len()
                );
                set.written.insert(category, path);
            }
            Err(e) => {
                log::error!("Failed to write {} manifest: {}", category, e);
                set.failures.push((category, e));
            }
        }
    }

    set
}
