//! Shared data models for the PoseCoach analysis core.
//!
//! This crate is deliberately inference- and IO-free: it defines the
//! serde/schema types that `posecoach-core` produces and consumes, so an
//! external collaborator (HTTP layer, PDF renderer, LLM prompt builder —
//! none of which are in scope here) can depend on the report and config
//! shapes without pulling in FFmpeg or ONNX Runtime.

pub mod config;
pub mod error;
pub mod exercise;
pub mod frame;
pub mod joint;
pub mod phase;
pub mod profile;
pub mod report;
pub mod score;

pub use config::Config;
pub use error::{ModelError, ModelResult};
pub use exercise::{ExerciseType, GripType};
pub use frame::Frame;
pub use joint::{Keypoint, KeypointSet, KeypointSetBuilder, Joint, ALL_JOINTS, MIN_VISIBILITY};
pub use phase::PhaseLabel;
pub use profile::{ExerciseProfileData, JointTriple, Rule};
pub use report::{AnalysisReport, DtwResult, FilteringInfo, FilteringMethod, Grade, WorstJoint};
pub use score::{FrameScore, RuleDetail, RuleStatus};
