//! PoseCoach command-line front end.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use posecoach_core::{AnalysisRequest, Analyzer, CancelToken, PoseDetector};
use posecoach_models::{Config, ExerciseType, GripType};

#[derive(Parser)]
#[command(name = "posecoach", version, about = "Exercise form analysis from video")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single exercise video and print the JSON report.
    Analyze {
        /// Path to the input video.
        video: PathBuf,

        /// Exercise performed in the video.
        #[arg(long, value_enum)]
        exercise: ExerciseArg,

        /// Grip type, required for pull-ups.
        #[arg(long, value_enum)]
        grip: Option<GripArg>,

        /// Path to the ONNX pose model.
        #[arg(long)]
        model: PathBuf,

        /// Directory to extract thumbnail frames into.
        #[arg(long, default_value = "thumbnails")]
        thumbnail_dir: PathBuf,

        /// Optional reference video to score form against via DTW.
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Directory to extract the reference video's thumbnails into.
        #[arg(long, default_value = "thumbnails-reference")]
        reference_thumbnail_dir: PathBuf,
    },

    /// Verify ffmpeg/ffprobe are reachable and the pose model loads cleanly.
    Selfcheck {
        /// Path to the ONNX pose model.
        #[arg(long)]
        model: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExerciseArg {
    Pushup,
    Pullup,
}

impl From<ExerciseArg> for ExerciseType {
    fn from(value: ExerciseArg) -> Self {
        match value {
            ExerciseArg::Pushup => ExerciseType::Pushup,
            ExerciseArg::Pullup => ExerciseType::Pullup,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum GripArg {
    Overhand,
    Underhand,
    Wide,
}

impl From<GripArg> for GripType {
    fn from(value: GripArg) -> Self {
        match value {
            GripArg::Overhand => GripType::Overhand,
            GripArg::Underhand => GripType::Underhand,
            GripArg::Wide => GripType::Wide,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive("posecoach=info".parse().unwrap()))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze { video, exercise, grip, model, thumbnail_dir, reference, reference_thumbnail_dir } => {
            run_analyze(video, exercise.into(), grip.map(Into::into), model, thumbnail_dir, reference, reference_thumbnail_dir).await
        }
        Command::Selfcheck { model } => run_selfcheck(model).await,
    };

    if let Err(e) = result {
        error!(error = %e, "posecoach failed");
        std::process::exit(1);
    }
}

async fn run_analyze(
    video: PathBuf,
    exercise_type: ExerciseType,
    grip_type: Option<GripType>,
    model: PathBuf,
    thumbnail_dir: PathBuf,
    reference: Option<PathBuf>,
    reference_thumbnail_dir: PathBuf,
) -> anyhow::Result<()> {
    info!(video = %video.display(), exercise = %exercise_type, "starting analysis");

    let config = match exercise_type {
        ExerciseType::Pushup => Config::pushup_defaults(),
        ExerciseType::Pullup => Config::pullup_defaults(),
    };

    tokio::fs::create_dir_all(&thumbnail_dir).await?;
    if reference.is_some() {
        tokio::fs::create_dir_all(&reference_thumbnail_dir).await?;
    }

    let detector = PoseDetector::load(&model)?;
    let analyzer = Analyzer::new(&config, &detector);
    let cancel = CancelToken::new();

    let request = AnalysisRequest {
        video_path: &video,
        thumbnail_dir: &thumbnail_dir,
        exercise_type,
        grip_type,
        reference_path: reference.as_deref(),
        reference_thumbnail_dir: reference.as_ref().map(|_| reference_thumbnail_dir.as_path()),
    };

    let report = analyzer.analyze(&request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_selfcheck(model: PathBuf) -> anyhow::Result<()> {
    which::which("ffmpeg").map_err(|e| anyhow::anyhow!("ffmpeg not available: {e}"))?;
    which::which("ffprobe").map_err(|e| anyhow::anyhow!("ffprobe not available: {e}"))?;
    if !model.exists() {
        return Err(anyhow::anyhow!("pose model not found at {}", model.display()));
    }
    PoseDetector::load(&model)?;
    println!("posecoach-selfcheck: ok");
    Ok(())
}
