//! Error types for the analysis pipeline.

use thiserror::Error;

use posecoach_models::ModelError;

/// Result type for core pipeline operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// The five error kinds an `analyze()` call can surface.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The input file, config, or profile was unusable before any decode
    /// work started: missing file, zero duration, unreadable config,
    /// unknown exercise/grip combination.
    #[error("invalid input: {0}")]
    InputError(String),

    /// FFmpeg/FFprobe could not produce usable frames: more than half the
    /// sampled frames failed to decode, or the tool is missing from PATH.
    #[error("decode failed: {0}")]
    DecodeError(String),

    /// The pose model failed to load or produced no usable output for an
    /// entire clip.
    #[error("pose detection failed: {0}")]
    DetectionError(String),

    /// Non-fatal: fewer than the minimum number of active frames were
    /// found. Callers that want a best-effort report should downgrade this
    /// to `AnalysisReport::warning` rather than aborting.
    #[error("insufficient motion: {0}")]
    InsufficientMotion(String),

    /// The caller's cancellation token fired.
    #[error("analysis cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        CoreError::InputError(e.to_string())
    }
}

impl CoreError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeError(message.into())
    }

    pub fn detection(message: impl Into<String>) -> Self {
        Self::DetectionError(message.into())
    }

    pub fn insufficient_motion(message: impl Into<String>) -> Self {
        Self::InsufficientMotion(message.into())
    }
}
