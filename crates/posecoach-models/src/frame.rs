//! The per-frame unit threaded through the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::joint::KeypointSet;

/// An ordered frame, identified by a monotonically increasing index
/// starting at 0.
///
/// `thumbnail_path` is an opaque token within the core: stage 1 writes it,
/// later stages and the report carry it without interpreting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Frame {
    pub frame_idx: u32,
    pub timestamp: f64,
    pub thumbnail_path: String,
    /// Present once stage 2 has run; `None` immediately after extraction.
    pub keypoints: Option<KeypointSet>,
}

impl Frame {
    pub fn new(frame_idx: u32, timestamp: f64, thumbnail_path: impl Into<String>) -> Self {
        Self {
            frame_idx,
            timestamp,
            thumbnail_path: thumbnail_path.into(),
            keypoints: None,
        }
    }

    pub fn with_keypoints(mut self, keypoints: KeypointSet) -> Self {
        self.keypoints = Some(keypoints);
        self
    }
}
