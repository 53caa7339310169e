//! Frame-rate probing and slow-motion detection

use std::path::Path;
use std::process::Command;

use crate::error::ProbeError;

/// Reads a video's frame rate.
///
/// Implementations are shared across hashing workers.
pub trait FrameRateProbe: Send + Sync {
    fn frame_rate(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Probe backed by an `ffprobe`-compatible executable
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the probe command for a file
    pub fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=r_frame_rate",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path);
        command
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PROBE_PROGRAM)
    }
}

impl FrameRateProbe for FfprobeProbe {
    fn frame_rate(&self, path: &Path) -> Result<f64, ProbeError> {
        let output = self
            .command(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let raw = stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(ProbeError::NoStream)?;
        parse_frame_rate(raw)
    }
}

/// Parse a frame rate given as a decimal ("29.97") or a rational ("30000/1001")
pub fn parse_frame_rate(raw: &str) -> Result<f64, ProbeError> {
    let raw = raw.trim();
    let malformed = || ProbeError::Malformed(raw.to_string());

    let fps = if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num.trim().parse().map_err(|_| malformed())?;
        let den: f64 = den.trim().parse().map_err(|_| malformed())?;
        if den == 0.0 {
            return Err(ProbeError::ZeroDenominator(raw.to_string()));
        }
        num / den
    } else {
        raw.parse().map_err(|_| malformed())?
    };

    if !fps.is_finite() || fps < 0.0 {
        return Err(malformed());
    }
    Ok(fps)
}

/// Decide whether a video is slow-motion.
///
/// Probe failures classify as not slow-motion so the file keeps its place in
/// the regular videos manifest.
pub fn is_slow_motion(probe: &dyn FrameRateProbe, path: &Path, threshold: f64) -> bool {
    match probe.frame_rate(path) {
        Ok(fps) => {
            log::debug!("{} runs at {:.2} fps", path.display(), fps);
            fps > threshold
        }
        Err(e) => {
            log::warn!(
                "Could not read frame rate for {}, treating as regular video: {}",
                path.display(),
                e
            );
            false
        }
    }
}
