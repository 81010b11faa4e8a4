//! Minimal FFmpeg CLI wrapper used by the frame extractor.
//!
//! Only single-frame extraction is needed here, so this is a narrow builder
//! rather than the general clip/filter toolkit a video-editing crate would
//! carry.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Builder for a single-frame FFmpeg extraction command.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    seek_secs: f64,
    video_filter: Option<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            seek_secs: 0.0,
            video_filter: None,
        }
    }

    pub fn seek(mut self, seconds: f64) -> Self {
        self.seek_secs = seconds;
        self
    }

    pub fn video_filter(mut self, filter: impl Into<String>) -> Self {
        self.video_filter = Some(filter.into());
        self
    }

    fn build_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-v".to_string(), "error".to_string()];
        args.push("-ss".to_string());
        args.push(format!("{:.3}", self.seek_secs));
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        args.push("-vframes".to_string());
        args.push("1".to_string());
        if let Some(filter) = &self.video_filter {
            args.push("-vf".to_string());
            args.push(filter.clone());
        }
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Runs `ffmpeg`/`ffprobe` commands, requiring both tools to be on `PATH`.
pub struct FfmpegRunner;

impl FfmpegRunner {
    /// Extract a single frame at `cmd`'s seek position. Returns `Ok(())` on
    /// success; a non-zero exit or spawn failure is reported as a
    /// `DecodeError` so callers can tally per-frame failure rates.
    pub async fn extract_frame(cmd: &FfmpegCommand) -> CoreResult<()> {
        which::which("ffmpeg").map_err(|_| CoreError::decode("ffmpeg not found in PATH"))?;

        let args = cmd.build_args();
        debug!("running ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CoreError::decode(format!("failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::decode(format!(
                "ffmpeg exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}
