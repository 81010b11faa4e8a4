//! Per-frame scoring records.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::phase::PhaseLabel;

/// Outcome of a single rule applied to a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Ok,
    Warning,
    Error,
}

/// The evaluation of one rule on one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleDetail {
    pub status: RuleStatus,
    /// Human-readable measured value, e.g. `"162.3 deg"`.
    pub value: String,
    /// Coaching feedback text for this rule at this frame (empty when `ok`).
    pub feedback: String,
}

/// The scored outcome for one active, in-phase frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameScore {
    pub frame_idx: u32,
    pub phase: PhaseLabel,
    pub score: f64,
    pub errors: Vec<String>,
    /// Keyed by rule name. `BTreeMap` for deterministic serialization order
    ///.
    pub details: BTreeMap<String, RuleDetail>,
}

impl FrameScore {
    /// Number of rule details whose status is `warning` or `error`.
    ///
    /// Must equal `errors.len()`.
    pub fn fault_count(&self) -> usize {
        self.details
            .values()
            .filter(|d| !matches!(d.status, RuleStatus::Ok))
            .count()
    }
}
