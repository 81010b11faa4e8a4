//! The analysis report: the sole product of the core.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::exercise::{ExerciseType, GripType};
use crate::frame::Frame;
use crate::phase::PhaseLabel;
use crate::score::FrameScore;

/// Which method produced the active/rest labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilteringMethod {
    /// The motion-energy + hysteresis rule (the primary path).
    RuleBased,
    /// The pre-trained classifier fallback.
    ClassifierFallback,
}

/// Activity-segmenter provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FilteringInfo {
    pub method: FilteringMethod,
    /// Populated only when `method == ClassifierFallback`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub total_frames: usize,
    pub active_frames: usize,
    pub rest_frames: usize,
}

/// Per-joint-triple worst alignment difference from DTW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorstJoint {
    pub triple_name: String,
    pub mean_abs_delta_deg: f64,
}

/// DTW comparison result against a reference video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DtwResult {
    pub overall_score: f64,
    pub phase_scores: BTreeMap<PhaseLabel, f64>,
    pub worst_joints: Vec<WorstJoint>,
}

/// Letter grade derived from `avg_score` (and `dtw` when active).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Grade {
    S,
    A,
    B,
    C,
}

impl Grade {
    /// `combined` is `avg_score` when DTW is inactive, else
    /// `avg_score*0.7 + dtw*0.3`.
    pub fn from_combined(combined: f64) -> Grade {
        if combined >= 0.9 {
            Grade::S
        } else if combined >= 0.7 {
            Grade::A
        } else if combined >= 0.5 {
            Grade::B
        } else {
            Grade::C
        }
    }
}

/// The composite, immutable output of `analyze()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub video_name: String,
    pub exercise_type: ExerciseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grip_type: Option<GripType>,

    pub duration: f64,
    pub fps: f64,
    pub total_frames: usize,

    pub exercise_count: u32,

    pub frame_scores: Vec<FrameScore>,
    pub error_frames: Vec<FrameScore>,

    pub keypoints: Vec<Frame>,
    pub selected_frame_indices: Vec<u32>,

    pub filtering: FilteringInfo,

    pub dtw_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtw_result: Option<DtwResult>,

    /// Mean of `frame.score` over all scored frames. `0.0` when there are no scored frames.
    pub avg_score: f64,
    /// Mean score per phase.
    pub phase_scores: BTreeMap<PhaseLabel, f64>,
    pub grade: Grade,

    /// Non-fatal condition surfaced alongside an otherwise successful report
    ///.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl AnalysisReport {
    /// `len(frame_scores) <= len(selected_frame_indices) <= total_frames`.
    pub fn invariant_frame_counts_ok(&self) -> bool {
        self.frame_scores.len() <= self.selected_frame_indices.len()
            && self.selected_frame_indices.len() <= self.total_frames
    }

    /// Every `error_frames[i]` is identically present in `frame_scores`.
    pub fn invariant_error_frames_subset(&self) -> bool {
        self.error_frames
            .iter()
            .all(|ef| self.frame_scores.iter().any(|fs| fs == ef))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::from_combined(0.95), Grade::S);
        assert_eq!(Grade::from_combined(0.9), Grade::S);
        assert_eq!(Grade::from_combined(0.89), Grade::A);
        assert_eq!(Grade::from_combined(0.7), Grade::A);
        assert_eq!(Grade::from_combined(0.69), Grade::B);
        assert_eq!(Grade::from_combined(0.5), Grade::B);
        assert_eq!(Grade::from_combined(0.49), Grade::C);
        assert_eq!(Grade::from_combined(0.0), Grade::C);
    }
}
