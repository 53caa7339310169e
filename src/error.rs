//! Error types for the media manifest pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Error kinds that can occur during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanErrorKind {
    /// Source directory missing or unreadable; the scan cannot proceed
    Enumeration,
    /// Permission denied when accessing a file or directory
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// I/O error during file operations
    Io,
    /// A worker ended without returning a result for the file
    Lost,
    /// Manifest could not be serialized or written
    ManifestWrite,
    /// Manifest could not be read back
    ManifestRead,
    /// Configuration rejected before the scan started
    InvalidConfig,
    /// Worker pool could not be built
    WorkerPool,
}

/// Represents an error that occurred during scanning or manifest handling
#[derive(Debug, Error)]
#[error("{kind:?}: {message} (path: {path:?})")]
pub struct ScanError {
    /// The kind of error
    pub kind: ScanErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(kind: ScanErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Create an enumeration error for a source root that cannot be walked
    pub fn enumeration(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::Enumeration, Some(path), message)
    }

    /// Create an I/O error, keeping permission and not-found kinds distinct
    pub fn io(path: PathBuf, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ScanErrorKind::NotFound,
            _ => ScanErrorKind::Io,
        };
        Self::new(kind, Some(path), err.to_string())
    }

    /// Create an error for a file whose worker never reported back
    pub fn lost(path: PathBuf) -> Self {
        Self::new(ScanErrorKind::Lost, Some(path), "worker ended without a result")
    }

    /// Create a manifest write error
    pub fn manifest_write(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::ManifestWrite, Some(path), message)
    }

    /// Create a manifest read error
    pub fn manifest_read(path: PathBuf, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::ManifestRead, Some(path), message)
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::InvalidConfig, None, message)
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ScanErrorKind::NotFound,
            _ => ScanErrorKind::Io,
        };
        Self::new(kind, None, err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ScanError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::new(ScanErrorKind::WorkerPool, None, err.to_string())
    }
}

/// Failure to determine a video's frame rate.
///
/// Callers treat every variant the same way: the file is not slow-motion.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe program could not be started (usually not installed)
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The probe exited with a non-zero status
    #[error("probe exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    /// The probe printed nothing, e.g. the file has no video stream
    #[error("no video stream reported")]
    NoStream,
    /// The frame-rate text could not be parsed
    #[error("malformed frame rate {0:?}")]
    Malformed(String),
    /// A rational frame rate had a zero denominator
    #[error("zero denominator in frame rate {0:?}")]
    ZeroDenominator(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kind_mapping() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let scan = ScanError::io(PathBuf::from("/x"), &err);
        assert_eq!(scan.kind, ScanErrorKind::PermissionDenied);
        assert_eq!(scan.path, Some(PathBuf::from("/x")));

        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ScanError::from(err).kind, ScanErrorKind::NotFound);

        let err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        assert_eq!(ScanError::from(err).kind, ScanErrorKind::Io);
    }

    #[test]
    fn test_lost_names_the_file() {
        let err = ScanError::lost(PathBuf::from("/media/a.mov"));
        assert_eq!(err.kind, ScanErrorKind::Lost);
        assert_eq!(err.path, Some(PathBuf::from("/media/a.mov")));
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::ZeroDenominator("0/0".to_string());
        assert_eq!(err.to_string(), "zero denominator in frame rate \"0/0\"");
    }
}
