//! Extension tables and the category classifier

use std::path::Path;
use std::sync::Arc;

use crate::models::{extension_of, Category, Origin};
use crate::probe::{is_slow_motion, FrameRateProbe};

/// Image formats produced natively by the capture device
pub const NATIVE_IMAGE_EXTENSIONS: &[&str] = &[".heic", ".heif"];

/// Video formats produced natively by the capture device
pub const NATIVE_VIDEO_EXTENSIONS: &[&str] = &[".mov"];

/// Other image formats, admitted only when non-native formats are included
pub const FOREIGN_IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".bmp", ".gif", ".tiff", ".tif", ".webp",
];

/// Other video formats, admitted only when non-native formats are included
pub const FOREIGN_VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".avi", ".mkv", ".webm", ".mts", ".m2ts", ".wmv", ".flv",
];

/// Media kind implied by an extension, before any probing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Look up an extension (lowercase, with leading dot) in the tables
pub fn lookup_extension(ext: &str) -> Option<(MediaKind, Origin)> {
    if NATIVE_IMAGE_EXTENSIONS.contains(&ext) {
        Some((MediaKind::Image, Origin::Native))
    } else if FOREIGN_IMAGE_EXTENSIONS.contains(&ext) {
        Some((MediaKind::Image, Origin::Foreign))
    } else if NATIVE_VIDEO_EXTENSIONS.contains(&ext) {
        Some((MediaKind::Video, Origin::Native))
    } else if FOREIGN_VIDEO_EXTENSIONS.contains(&ext) {
        Some((MediaKind::Video, Origin::Foreign))
    } else {
        None
    }
}

/// Category and origin of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub origin: Origin,
}

/// Maps file paths to categories, probing videos for slow motion
#[derive(Clone)]
pub struct Classifier {
    probe: Arc<dyn FrameRateProbe>,
    slowmo_fps_threshold: f64,
}

impl Classifier {
    pub fn new(probe: Arc<dyn FrameRateProbe>, slowmo_fps_threshold: f64) -> Self {
        Self {
            probe,
            slowmo_fps_threshold,
        }
    }

    /// Classify a file.
    ///
    /// Returns None for unknown extensions. Images never reach the probe.
    pub fn classify(&self, path: &Path) -> Option<Classification> {
        let (kind, origin) = lookup_extension(&extension_of(path))?;
        let category = match kind {
            MediaKind::Image => Category::Photos,
            MediaKind::Video => {
                if is_slow_motion(self.probe.as_ref(), path, self.slowmo_fps_threshold) {
                    Category::Slowmo
                } else {
                    Category::Videos
                }
            }
        };
        Some(Classification { category, origin })
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("slowmo_fps_threshold", &self.slowmo_fps_threshold)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a fixed frame rate and counts how often it was asked
    struct CountingProbe {
        fps: Option<f64>,
        calls: AtomicUsize,
    }

    impl CountingProbe {
        fn new(fps: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                fps,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl FrameRateProbe for CountingProbe {
        fn frame_rate(&self, _path: &Path) -> Result<f64, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.fps.ok_or(ProbeError::NoStream)
        }
    }

    fn category(classifier: &Classifier, path: &str) -> Category {
        classifier
            .classify(Path::new(path))
            .map(|c| c.category)
            .unwrap_or(Category::Excluded)
    }

    fn origin(path: &str) -> Option<Origin> {
        lookup_extension(&extension_of(Path::new(path))).map(|(_, origin)| origin)
    }

    #[test]
    fn test_images_never_probe() {
        let probe = CountingProbe::new(Some(240.0));
        let classifier = Classifier::new(probe.clone(), 100.0);

        for ext in NATIVE_IMAGE_EXTENSIONS.iter().chain(FOREIGN_IMAGE_EXTENSIONS) {
            let path = format!("/media/photo{ext}");
            assert_eq!(category(&classifier, &path), Category::Photos);
        }
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_video_by_frame_rate() {
        let fast = Classifier::new(CountingProbe::new(Some(240.0)), 100.0);
        let slow = Classifier::new(CountingProbe::new(Some(30.0)), 100.0);
        let edge = Classifier::new(CountingProbe::new(Some(100.0)), 100.0);

        assert_eq!(category(&fast, "/a.mov"), Category::Slowmo);
        assert_eq!(category(&fast, "/a.mp4"), Category::Slowmo);
        assert_eq!(category(&slow, "/a.mov"), Category::Videos);
        assert_eq!(category(&edge, "/a.MOV"), Category::Videos);
    }

    #[test]
    fn test_probe_failure_is_regular_video() {
        let probe = CountingProbe::new(None);
        let classifier = Classifier::new(probe.clone(), 100.0);
        assert_eq!(category(&classifier, "/clip.mkv"), Category::Videos);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_extension() {
        let classifier = Classifier::new(CountingProbe::new(Some(30.0)), 100.0);
        assert!(classifier.classify(Path::new("/notes.txt")).is_none());
        assert!(classifier.classify(Path::new("/Makefile")).is_none());
        assert_eq!(category(&classifier, "/x.pdf"), Category::Excluded);
    }

    #[test]
    fn test_origin_is_by_extension_only() {
        assert_eq!(origin("/a.HEIC"), Some(Origin::Native));
        assert_eq!(origin("/a.mov"), Some(Origin::Native));
        assert_eq!(origin("/a.jpg"), Some(Origin::Foreign));
        assert_eq!(origin("/a.m2ts"), Some(Origin::Foreign));
        assert_eq!(origin("/a.doc"), None);

        // a native video stays native when it lands in slowmo
        let classifier = Classifier::new(CountingProbe::new(Some(240.0)), 100.0);
        let result = classifier.classify(Path::new("/a.mov")).unwrap();
        assert_eq!(result.category, Category::Slowmo);
        assert_eq!(result.origin, Origin::Native);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let classifier = Classifier::new(CountingProbe::new(Some(60.0)), 100.0);
        for name in ["/a.heic", "/b.mov", "/c.mp4", "/d.txt"] {
            let path = Path::new(name);
            assert_eq!(classifier.classify(path), classifier.classify(path));
        }
    }
}
