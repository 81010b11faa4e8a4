//! Validation errors for model-level data (configuration, exercise profiles).
//!
//! These are distinct from `posecoach_core::error::CoreError`: they describe
//! malformed *data*, not pipeline failures. `posecoach-core` converts them
//! into its own `InputError` variant at the boundary.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid exercise profile: {0}")]
    InvalidProfile(String),
}

impl ModelError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile(message.into())
    }
}
