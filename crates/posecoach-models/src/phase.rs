//! Kinematic phase labels for one repetition cycle.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One of six labels describing where a frame sits within a repetition cycle.
///
/// `ready`/`finish` bound the active region; `top`/`bottom` are the extrema
/// of a rep; `ascending`/`descending` are the transitions between them
///.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PhaseLabel {
    Ready,
    Descending,
    Bottom,
    Ascending,
    Top,
    Finish,
}

impl PhaseLabel {
    /// Phases that are scored by the posture evaluator; `ready`/`finish` are
    /// excluded.
    pub fn is_scored(self) -> bool {
        !matches!(self, PhaseLabel::Ready | PhaseLabel::Finish)
    }

    pub const ALL: [PhaseLabel; 6] = [
        PhaseLabel::Ready,
        PhaseLabel::Descending,
        PhaseLabel::Bottom,
        PhaseLabel::Ascending,
        PhaseLabel::Top,
        PhaseLabel::Finish,
    ];
}

impl std::fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PhaseLabel::Ready => "ready",
            PhaseLabel::Descending => "descending",
            PhaseLabel::Bottom => "bottom",
            PhaseLabel::Ascending => "ascending",
            PhaseLabel::Top => "top",
            PhaseLabel::Finish => "finish",
        };
        f.write_str(s)
    }
}
