//! End-to-end scan of a small media tree with scripted frame rates

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use media_manifest::manifest::manifest_path;
use media_manifest::{
    read_manifest, scan_with_timestamp, Category, CategoryPolicy, ChecksumMap, Classifier,
    FrameRateProbe, InclusionPolicy, NoopObserver, ProbeError, ScanConfig,
};
use tempfile::TempDir;

const TIMESTAMP: &str = "20250102_030405";

struct ScriptedProbe(HashMap<&'static str, f64>);

impl FrameRateProbe for ScriptedProbe {
    fn frame_rate(&self, path: &Path) -> Result<f64, ProbeError> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| ProbeError::Malformed(String::new()))
    }
}

fn media_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("album")).unwrap();
    fs::write(dir.path().join("a.heic"), b"heic pixels").unwrap();
    fs::write(dir.path().join("album/b.heic"), b"heic pixels").unwrap();
    fs::write(dir.path().join("c.jpg"), b"jpeg pixels").unwrap();
    fs::write(dir.path().join("d.mov"), b"240 fps clip").unwrap();
    fs::write(dir.path().join("album/e.mp4"), b"30 fps clip").unwrap();
    dir
}

fn classifier() -> Classifier {
    let rates = HashMap::from([("d.mov", 240.0), ("e.mp4", 30.0)]);
    Classifier::new(Arc::new(ScriptedProbe(rates)), 100.0)
}

fn file_names(paths: &[String]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn sorted_groups(map: &ChecksumMap) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = map.iter().map(|(_, paths)| file_names(paths)).collect();
    groups.sort();
    groups
}

#[test]
fn test_full_scan_writes_three_manifests() {
    let source = media_tree();
    let dest = TempDir::new().unwrap();
    let config = ScanConfig::builder()
        .source_dir(source.path().to_path_buf())
        .manifest_dir(dest.path().to_path_buf())
        .policy(InclusionPolicy::all())
        .build();

    let outcome = scan_with_timestamp(&config, classifier(), &NoopObserver, TIMESTAMP).unwrap();

    assert_eq!(outcome.total_files, 5);
    assert_eq!(outcome.admitted_files, 5);
    assert_eq!(outcome.duplicate_files, 1);
    assert!(outcome.is_success());

    let photos = read_manifest(&outcome.manifests[&Category::Photos])
        .unwrap()
        .unwrap();
    assert_eq!(photos.len(), 2);
    assert_eq!(
        sorted_groups(&photos),
        vec![vec!["a.heic", "b.heic"], vec!["c.jpg"]]
    );

    let slowmo = read_manifest(&outcome.manifests[&Category::Slowmo])
        .unwrap()
        .unwrap();
    assert_eq!(sorted_groups(&slowmo), vec![vec!["d.mov"]]);

    let videos = read_manifest(&outcome.manifests[&Category::Videos])
        .unwrap()
        .unwrap();
    assert_eq!(sorted_groups(&videos), vec![vec!["e.mp4"]]);

    // manifests on disk match what the scan aggregated
    assert_eq!(outcome.map(Category::Photos), Some(&photos));
    assert_eq!(
        outcome.manifests[&Category::Videos],
        manifest_path(dest.path(), Category::Videos, TIMESTAMP)
    );
    for path in outcome.manifests.values() {
        assert!(path.starts_with(dest.path().join("data").join(TIMESTAMP)));
    }
    for paths in photos.iter().map(|(_, p)| p) {
        assert!(paths.iter().all(|p| Path::new(p).is_absolute()));
    }
}

#[test]
fn test_native_only_scan() {
    let source = media_tree();
    let dest = TempDir::new().unwrap();
    let config = ScanConfig::builder()
        .source_dir(source.path().to_path_buf())
        .manifest_dir(dest.path().to_path_buf())
        .policy(InclusionPolicy::native_only())
        .build();

    let outcome = scan_with_timestamp(&config, classifier(), &NoopObserver, TIMESTAMP).unwrap();

    let photos = outcome.map(Category::Photos).unwrap();
    assert_eq!(sorted_groups(photos), vec![vec!["a.heic", "b.heic"]]);
    assert!(outcome.manifests.contains_key(&Category::Slowmo));
    // e.mp4 is the only regular video and it is foreign
    assert!(!outcome.manifests.contains_key(&Category::Videos));
    assert!(!manifest_path(dest.path(), Category::Videos, TIMESTAMP).exists());
    assert_eq!(outcome.filtered_files, 2);
}

#[test]
fn test_excluded_category_has_no_manifest() {
    let source = media_tree();
    let dest = TempDir::new().unwrap();
    let policy = InclusionPolicy::all()
        .with_category(Category::Slowmo, CategoryPolicy::new(false, false));
    let config = ScanConfig::builder()
        .source_dir(source.path().to_path_buf())
        .manifest_dir(dest.path().to_path_buf())
        .policy(policy)
        .build();

    let outcome = scan_with_timestamp(&config, classifier(), &NoopObserver, TIMESTAMP).unwrap();

    assert!(!outcome.manifests.contains_key(&Category::Slowmo));
    assert!(outcome.map(Category::Slowmo).is_none());
    // the slow-motion clip is not demoted into videos
    let videos = outcome.map(Category::Videos).unwrap();
    assert_eq!(sorted_groups(videos), vec![vec!["e.mp4"]]);
}

#[test]
fn test_missing_manifest_means_no_work() {
    let dest = TempDir::new().unwrap();
    let path = manifest_path(dest.path(), Category::Videos, TIMESTAMP);
    assert!(read_manifest(&path).unwrap().is_none());
}
