//! Exercise and grip-type enums recognized by the analysis core.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The two recognized exercise profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Pushup,
    Pullup,
}

impl std::fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseType::Pushup => f.write_str("pushup"),
            ExerciseType::Pullup => f.write_str("pullup"),
        }
    }
}

/// Pull-up grip sub-type. Only meaningful when `ExerciseType::Pullup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GripType {
    Overhand,
    Underhand,
    Wide,
}

impl std::fmt::Display for GripType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GripType::Overhand => f.write_str("overhand"),
            GripType::Underhand => f.write_str("underhand"),
            GripType::Wide => f.write_str("wide"),
        }
    }
}
