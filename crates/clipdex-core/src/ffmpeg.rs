//! FFmpeg Frame Extraction
//!
//! Executes an external ffmpeg binary to extract single frames for clip
//! thumbnails. Supports an explicitly configured binary path or discovery
//! via the system `PATH`; every invocation is bounded by a timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::ThumbnailConfig;

/// ffmpeg-related error types.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("ffmpeg not found. Install ffmpeg or configure an explicit binary path.")]
    NotFound,

    #[error("ffmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("Process error: {0}")]
    ProcessError(std::io::Error),

    #[error("Timeout: frame extraction took too long")]
    Timeout,
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Find ffmpeg in the system PATH.
pub fn detect_system_ffmpeg() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let (lookup, binary) = ("where", "ffmpeg.exe");

    #[cfg(not(target_os = "windows"))]
    let (lookup, binary) = ("which", "ffmpeg");

    let output = std::process::Command::new(lookup).arg(binary).output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Executes ffmpeg for single-frame extraction.
///
/// Construction never probes the binary; a missing tool surfaces as
/// [`FrameError::NotFound`] at extraction time so the caller can degrade
/// instead of failing the whole run.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    ffmpeg_path: PathBuf,
    scale: (u32, u32),
    timeout: Duration,
}

impl FrameExtractor {
    /// Create an extractor over an explicit ffmpeg binary path.
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            scale: (640, 360),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from thumbnail configuration: explicit path if given, then
    /// PATH discovery, then the bare binary name as a last resort.
    pub fn from_config(config: &ThumbnailConfig) -> Self {
        let ffmpeg_path = config
            .ffmpeg_path
            .clone()
            .or_else(detect_system_ffmpeg)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));

        let mut extractor = Self::new(ffmpeg_path);
        extractor.scale = config.scale;
        extractor.timeout = config.extraction_timeout;
        extractor
    }

    /// Set the output frame size.
    pub fn with_scale(mut self, width: u32, height: u32) -> Self {
        self.scale = (width, height);
        self
    }

    /// Bound a single invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract a single frame at `time_sec` into `output` (JPEG).
    pub async fn extract_frame(
        &self,
        input: &Path,
        time_sec: f64,
        output: &Path,
    ) -> FrameResult<()> {
        if !input.exists() {
            return Err(FrameError::InvalidInput(format!(
                "Input file does not exist: {}",
                input.display()
            )));
        }

        let (width, height) = self.scale;

        // -ss before -i for fast seeking, single frame, good JPEG quality.
        let mut command = tokio::process::Command::new(&self.ffmpeg_path);
        command
            .args([
                "-ss",
                &format!("{:.3}", time_sec),
                "-i",
                &input.to_string_lossy(),
                "-frames:v",
                "1",
                "-vf",
                &format!("scale={}:{}", width, height),
                "-q:v",
                "2",
                "-y",
                &output.to_string_lossy(),
            ])
            .kill_on_drop(true);

        debug!("Extracting frame at {:.3}s from {}", time_sec, input.display());

        let run = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| FrameError::Timeout)?;

        let result = match run {
            Ok(result) => result,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(FrameError::NotFound),
            Err(e) => return Err(FrameError::ProcessError(e)),
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let truncated: String = stderr.chars().take(500).collect();
            return Err(FrameError::ExecutionFailed(truncated));
        }

        if !output.exists() {
            return Err(FrameError::ExecutionFailed(
                "ffmpeg exited successfully but wrote no frame".to_string(),
            ));
        }

        Ok(())
    }
}
