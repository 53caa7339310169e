//! Logger setup: console plus a durable per-scan log file

use env_logger::{Env, Target};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Location of the log file for a scan
pub fn log_file_path(manifest_dir: &Path, timestamp: &str) -> PathBuf {
    manifest_dir
        .join("logs")
        .join(timestamp)
        .join(format!("scan_{timestamp}.txt"))
}

/// Writes every record to stderr and to the log file
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // the console copy is best effort; the file is the durable record
        let _ = io::stderr().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stderr().flush();
        self.file.flush()
    }
}

/// Initialize the global logger.
///
/// Defaults to `info`, overridable through `RUST_LOG`. With a `log_file`,
/// records are also appended there.
pub fn init(log_file: Option<&Path>) -> io::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(TeeWriter { file })));
    }

    // a logger installed earlier (e.g. by a test harness) wins
    let _ = builder.try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path_layout() {
        let path = log_file_path(Path::new("/out"), "20240101_120000");
        assert_eq!(
            path,
            PathBuf::from("/out/logs/20240101_120000/scan_20240101_120000.txt")
        );
    }

    #[test]
    fn test_tee_writer_appends_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.txt");
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();
        let mut tee = TeeWriter { file };
        tee.write_all(b"first\n").unwrap();
        tee.write_all(b"second\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_init_creates_log_directory() {
        let dir = TempDir::new().unwrap();
        let path = log_file_path(dir.path(), "20240101_120000");
        init(Some(&path)).unwrap();
        assert!(path.exists());
    }
}
