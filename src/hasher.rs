//! Content hashing

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::ScanError;

/// Compute the MD5 digest of a file's full content as lowercase hex.
///
/// Reads `chunk_size` bytes at a time so memory use does not grow with file size.
pub fn compute_checksum(path: &Path, chunk_size: usize) -> Result<String, ScanError> {
    let file = File::open(path).map_err(|e| ScanError::io(path.to_path_buf(), &e))?;
    checksum_reader(file, chunk_size).map_err(|e| ScanError::io(path.to_path_buf(), &e))
}

/// Digest any reader to exhaustion
pub fn checksum_reader<R: Read>(mut reader: R, chunk_size: usize) -> std::io::Result<String> {
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
