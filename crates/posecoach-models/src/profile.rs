//! Exercise profile data: the joint triples, driver definition, and rule
//! catalog that make posture evaluation exercise-specific.
//!
//! Profiles are plain data, not code — `posecoach-core` is the only place
//! that interprets them, via the `ExerciseProfile` trait. Keeping them here,
//! alongside the rest of the serde-friendly data model, is what lets an
//! external collaborator (not part of this crate's scope) serialize and
//! display them without depending on the inference/pipeline crate.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::exercise::{ExerciseType, GripType};
use crate::joint::Joint;
use crate::phase::PhaseLabel;

/// A named angle defined by three joints: the angle is measured at `b`,
/// between the rays `b->a` and `b->c`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JointTriple {
    pub name: String,
    pub a: Joint,
    pub b: Joint,
    pub c: Joint,
}

impl JointTriple {
    pub fn new(name: impl Into<String>, a: Joint, b: Joint, c: Joint) -> Self {
        Self { name: name.into(), a, b, c }
    }
}

/// One posture rule: a target angle band on a named triple, applicable on a
/// set of phases, with a weight and fault messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    pub name: String,
    pub phases: Vec<PhaseLabel>,
    /// References a `JointTriple::name` in the owning profile.
    pub triple: String,
    pub target_lo: f64,
    pub target_hi: f64,
    pub weight: f64,
    pub warning_message: String,
    pub error_message: String,
}

impl Rule {
    pub fn applies_to(&self, phase: PhaseLabel) -> bool {
        self.phases.contains(&phase)
    }
}

/// The complete data description of one exercise (and, for pull-ups, one
/// grip sub-type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExerciseProfileData {
    pub exercise: ExerciseType,
    pub sub_type: Option<GripType>,
    pub triples: Vec<JointTriple>,
    /// Name of the `JointTriple` used as the driver angle.
    pub driver_triple: String,
    /// Whether the raw driver angle must be inverted so that `d=1` means
    /// "top of rep".
    pub driver_invert: bool,
    pub rules: Vec<Rule>,
    pub scored_phases: Vec<PhaseLabel>,
}

impl ExerciseProfileData {
    pub fn triple(&self, name: &str) -> Option<&JointTriple> {
        self.triples.iter().find(|t| t.name == name)
    }

    pub fn driver_triple(&self) -> Option<&JointTriple> {
        self.triple(&self.driver_triple)
    }

    /// Structural validation: every rule and the driver reference a triple
    /// that actually exists in this profile.
    pub fn validate(&self) -> ModelResult<()> {
        if self.driver_triple().is_none() {
            return Err(ModelError::profile(format!(
                "driver_triple '{}' not found among declared triples",
                self.driver_triple
            )));
        }
        for rule in &self.rules {
            if self.triple(&rule.triple).is_none() {
                return Err(ModelError::profile(format!(
                    "rule '{}' references unknown triple '{}'",
                    rule.name, rule.triple
                )));
            }
            if rule.target_lo > rule.target_hi {
                return Err(ModelError::profile(format!(
                    "rule '{}' has target_lo > target_hi",
                    rule.name
                )));
            }
            if rule.weight <= 0.0 {
                return Err(ModelError::profile(format!(
                    "rule '{}' has non-positive weight",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExerciseProfileData {
        ExerciseProfileData {
            exercise: ExerciseType::Pushup,
            sub_type: None,
            triples: vec![JointTriple::new(
                "elbow",
                Joint::LeftShoulder,
                Joint::LeftElbow,
                Joint::LeftWrist,
            )],
            driver_triple: "elbow".to_string(),
            driver_invert: false,
            rules: vec![Rule {
                name: "elbow_extension".to_string(),
                phases: vec![PhaseLabel::Top],
                triple: "elbow".to_string(),
                target_lo: 160.0,
                target_hi: 180.0,
                weight: 1.0,
                warning_message: "Extend your arms further".to_string(),
                error_message: "Arms not extended".to_string(),
            }],
            scored_phases: vec![PhaseLabel::Top, PhaseLabel::Bottom],
        }
    }

    #[test]
    fn valid_profile_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn unknown_driver_triple_is_rejected() {
        let mut profile = sample();
        profile.driver_triple = "missing".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn rule_referencing_unknown_triple_is_rejected() {
        let mut profile = sample();
        profile.rules[0].triple = "missing".to_string();
        assert!(profile.validate().is_err());
    }
}
