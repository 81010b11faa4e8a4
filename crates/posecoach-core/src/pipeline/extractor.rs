//! Stage 1: Frame Extractor.
//!
//! Probes the source video with `ffprobe`, then pulls frames at
//! `extract_fps` by seeking with `ffmpeg`, one thumbnail per selected
//! source frame.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::warn;

use posecoach_models::{Config, Frame};

use crate::cancel::CancelToken;
use crate::error::{CoreError, CoreResult};
use crate::ffmpeg::{FfmpegCommand, FfmpegRunner};

/// Source video properties needed to drive sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            Some(num / den)
        } else {
            None
        }
    } else {
        s.parse().ok()
    }
}

/// Probe a video file for duration, dimensions, and source frame rate.
///
/// Raises `InputError` for a missing file, a missing video stream, or a
/// zero-duration video.
pub async fn probe_video(path: impl AsRef<Path>) -> CoreResult<VideoInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CoreError::input(format!("file not found: {}", path.display())));
    }

    which::which("ffprobe").map_err(|_| CoreError::input("ffprobe not found in PATH"))?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| CoreError::input(format!("failed to spawn ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(CoreError::input(format!(
            "ffprobe failed on {}",
            path.display()
        )));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| CoreError::input("no video stream found"))?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(CoreError::input("video has zero duration"));
    }

    let fps = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r))
        .filter(|f| *f > 0.0)
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
    })
}

/// Source frame indices to sample at `r_tgt` given `r_src` and the total
/// number of source frames, using the `⌊i·r_tgt/r_src⌋` selection rule.
pub fn select_sample_indices(total_src_frames: u32, r_src: f64, r_tgt: f64) -> Vec<u32> {
    if total_src_frames == 0 || r_src <= 0.0 {
        return Vec::new();
    }
    let mut selected = Vec::new();
    let mut prev_bucket = -1i64;
    for i in 0..total_src_frames {
        let bucket = ((i as f64) * r_tgt / r_src).floor() as i64;
        if bucket > prev_bucket {
            selected.push(i);
            prev_bucket = bucket;
        }
    }
    selected
}

/// Extracts frames from `video_path` at `config.extract_fps`, writing
/// thumbnails under `thumbnail_dir`.
pub struct FrameExtractor<'a> {
    config: &'a Config,
}

impl<'a> FrameExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn extract(
        &self,
        video_path: &Path,
        thumbnail_dir: &Path,
        cancel: &CancelToken,
    ) -> CoreResult<(VideoInfo, Vec<Frame>)> {
        let info = probe_video(video_path).await?;
        cancel.check()?;

        let total_src_frames = (info.duration * info.fps).round().max(1.0) as u32;
        let r_tgt = self.config.extract_fps as f64;
        let sample_indices = select_sample_indices(total_src_frames, info.fps, r_tgt);

        if sample_indices.is_empty() {
            return Err(CoreError::decode("no frames selected for sampling"));
        }

        std::fs::create_dir_all(thumbnail_dir)?;

        let mut frames = Vec::with_capacity(sample_indices.len());
        let mut failures = 0usize;

        for (frame_idx, &src_idx) in sample_indices.iter().enumerate() {
            if frame_idx % 16 == 0 {
                cancel.check()?;
            }

            let timestamp = src_idx as f64 / info.fps;
            let thumbnail_path: PathBuf = thumbnail_dir.join(format!("frame_{frame_idx:06}.jpg"));

            let cmd = FfmpegCommand::new(video_path, &thumbnail_path).seek(timestamp);
            match FfmpegRunner::extract_frame(&cmd).await {
                Ok(()) => {
                    frames.push(Frame::new(
                        frame_idx as u32,
                        timestamp,
                        thumbnail_path.to_string_lossy().to_string(),
                    ));
                }
                Err(e) => {
                    warn!(frame_idx, src_idx, error = %e, "frame decode failed, dropping");
                    failures += 1;
                }
            }
        }

        let attempted = sample_indices.len();
        if attempted > 0 && failures * 2 > attempted {
            return Err(CoreError::decode(format!(
                "{failures}/{attempted} sampled frames failed to decode"
            )));
        }

        Ok((info, frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsampling_halves_the_rate() {
        // 30fps source -> 10fps target keeps roughly every third frame.
        let selected = select_sample_indices(30, 30.0, 10.0);
        assert_eq!(selected.len(), 10);
        assert_eq!(selected[0], 0);
    }

    #[test]
    fn target_rate_above_source_keeps_every_frame() {
        let selected = select_sample_indices(10, 10.0, 30.0);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    fn empty_source_yields_no_samples() {
        assert!(select_sample_indices(0, 30.0, 10.0).is_empty());
    }
}
