//! Minimal selfcheck binary for health checks in deployment environments,
//! independent of the `clap`-based `posecoach` CLI.

use std::path::Path;
use std::process::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let model_path = std::env::var("POSECOACH_MODEL_PATH")
        .map_err(|_| anyhow::anyhow!("POSECOACH_MODEL_PATH must be set"))?;

    println!("posecoach-selfcheck: starting with model_path={model_path}");
    ensure_ffmpeg()?;
    ensure_ffprobe()?;
    ensure_model_present(Path::new(&model_path))?;

    println!("posecoach-selfcheck: ok");
    Ok(())
}

fn ensure_ffmpeg() -> anyhow::Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffmpeg not available: {e}"))?;
    if !output.status.success() {
        return Err(anyhow::anyhow!("ffmpeg -version failed: {:?}", output.status));
    }
    Ok(())
}

fn ensure_ffprobe() -> anyhow::Result<()> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("ffprobe not available: {e}"))?;
    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe -version failed: {:?}", output.status));
    }
    Ok(())
}

fn ensure_model_present(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        return Err(anyhow::anyhow!("pose model not found at {}", path.display()));
    }
    Ok(())
}
