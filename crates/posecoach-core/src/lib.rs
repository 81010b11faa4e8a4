#![deny(unreachable_patterns)]
//! PoseCoach analysis core.
//!
//! Turns a raw exercise video plus a small configuration into a structured
//! `AnalysisReport`: frame extraction, batched pose inference, signal
//! conditioning, activity segmentation, phase/rep counting, posture
//! scoring, and optional DTW comparison against a reference clip.

pub mod angles;
pub mod cancel;
pub mod error;
pub mod ffmpeg;
pub mod pipeline;
pub mod profiles;
pub mod smoothing;

pub use cancel::CancelToken;
pub use error::{CoreError, CoreResult};
pub use pipeline::{AnalysisRequest, Analyzer};
pub use pipeline::pose_detector::PoseDetector;
pub use profiles::{ExerciseProfile, ExerciseProfileFactory, PullupProfile, PushupProfile};
