//! Built-in exercise profiles and the `ExerciseProfile` dispatch trait
//!.
//!
//! Conditioning on exercise type is confined to this module: everywhere
//! else, a single `ExerciseProfile` trait object is looked up once at
//! `analyze()` entry, mirroring the `StyleProcessorFactory` pattern.

use posecoach_models::{ExerciseProfileData, ExerciseType, GripType, Joint, JointTriple, PhaseLabel, Rule};

use crate::error::{CoreError, CoreResult};

/// Behavior an exercise profile must supply beyond its data.
pub trait ExerciseProfile: Send + Sync {
    fn data(&self) -> &ExerciseProfileData;

    /// Map the raw driver angle (degrees) to `d ∈ [0,1]`, where `1` means
    /// "top of rep" and `0` means "bottom of rep".
    fn normalize_driver(&self, raw_degrees: f64) -> f64;

    fn rules(&self) -> &[Rule] {
        &self.data().rules
    }

    fn scored_phases(&self) -> &[PhaseLabel] {
        &self.data().scored_phases
    }

    fn sub_type(&self) -> Option<GripType> {
        self.data().sub_type
    }
}

/// Push-up profile: elbow angle, larger = extended = top of rep.
pub struct PushupProfile {
    data: ExerciseProfileData,
}

impl PushupProfile {
    pub fn new() -> Self {
        let triples = vec![
            JointTriple::new("elbow", Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
            JointTriple::new("hip_sag", Joint::LeftShoulder, Joint::LeftHip, Joint::LeftKnee),
        ];
        let rules = vec![
            Rule {
                name: "elbow_extension".to_string(),
                phases: vec![PhaseLabel::Top],
                triple: "elbow".to_string(),
                target_lo: 160.0,
                target_hi: 180.0,
                weight: 1.0,
                warning_message: "Straighten your arms fully at the top".to_string(),
                error_message: "Arms not extended at the top".to_string(),
            },
            Rule {
                name: "elbow_depth".to_string(),
                phases: vec![PhaseLabel::Bottom],
                triple: "elbow".to_string(),
                target_lo: 70.0,
                target_hi: 100.0,
                weight: 1.0,
                warning_message: "Lower a bit further for full range".to_string(),
                error_message: "Not descending far enough".to_string(),
            },
            Rule {
                name: "elbow_range".to_string(),
                phases: vec![PhaseLabel::Descending, PhaseLabel::Ascending],
                triple: "elbow".to_string(),
                target_lo: 60.0,
                target_hi: 185.0,
                weight: 1.0,
                warning_message: "Keep the movement smooth through the full range".to_string(),
                error_message: "Elbow angle out of the expected range of motion".to_string(),
            },
            Rule {
                name: "hip_sag".to_string(),
                phases: vec![
                    PhaseLabel::Descending,
                    PhaseLabel::Bottom,
                    PhaseLabel::Ascending,
                    PhaseLabel::Top,
                ],
                triple: "hip_sag".to_string(),
                target_lo: 167.0,
                target_hi: 183.0,
                weight: 1.0,
                warning_message: "Keep your hips in line with your shoulders".to_string(),
                error_message: "Hips are sagging".to_string(),
            },
        ];
        let data = ExerciseProfileData {
            exercise: ExerciseType::Pushup,
            sub_type: None,
            triples,
            driver_triple: "elbow".to_string(),
            driver_invert: false,
            rules,
            scored_phases: vec![
                PhaseLabel::Descending,
                PhaseLabel::Bottom,
                PhaseLabel::Ascending,
                PhaseLabel::Top,
            ],
        };
        Self { data }
    }
}

impl Default for PushupProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl ExerciseProfile for PushupProfile {
    fn data(&self) -> &ExerciseProfileData {
        &self.data
    }

    fn normalize_driver(&self, raw_degrees: f64) -> f64 {
        // 70 deg (bottom) -> 0, 180 deg (top, fully extended) -> 1.
        ((raw_degrees - 70.0) / (180.0 - 70.0)).clamp(0.0, 1.0)
    }
}

/// Pull-up profile: elbow angle, smaller = flexed = top of rep, so the
/// driver is inverted before normalization.
pub struct PullupProfile {
    data: ExerciseProfileData,
}

impl PullupProfile {
    pub fn new(grip: GripType) -> Self {
        let triples = vec![
            JointTriple::new("elbow", Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
            JointTriple::new("shoulder_hip", Joint::LeftElbow, Joint::LeftShoulder, Joint::LeftHip),
        ];
        let rules = vec![
            Rule {
                name: "elbow_flexion".to_string(),
                phases: vec![PhaseLabel::Top],
                triple: "elbow".to_string(),
                target_lo: 30.0,
                target_hi: 70.0,
                weight: 1.0,
                warning_message: "Pull your chin higher over the bar".to_string(),
                error_message: "Not reaching full flexion at the top".to_string(),
            },
            Rule {
                name: "dead_hang".to_string(),
                phases: vec![PhaseLabel::Bottom],
                triple: "elbow".to_string(),
                target_lo: 160.0,
                target_hi: 180.0,
                weight: 1.0,
                warning_message: "Extend fully to a dead hang at the bottom".to_string(),
                error_message: "Not reaching a full dead hang".to_string(),
            },
            Rule {
                name: "body_control".to_string(),
                phases: vec![PhaseLabel::Ascending, PhaseLabel::Descending],
                triple: "shoulder_hip".to_string(),
                target_lo: 150.0,
                target_hi: 180.0,
                weight: 1.2,
                warning_message: "Minimize the kipping swing".to_string(),
                error_message: "Excessive body swing".to_string(),
            },
        ];
        let data = ExerciseProfileData {
            exercise: ExerciseType::Pullup,
            sub_type: Some(grip),
            triples,
            driver_triple: "elbow".to_string(),
            driver_invert: true,
            rules,
            scored_phases: vec![
                PhaseLabel::Descending,
                PhaseLabel::Bottom,
                PhaseLabel::Ascending,
                PhaseLabel::Top,
            ],
        };
        Self { data }
    }
}

impl ExerciseProfile for PullupProfile {
    fn data(&self) -> &ExerciseProfileData {
        &self.data
    }

    fn normalize_driver(&self, raw_degrees: f64) -> f64 {
        // Invert: 180 deg (dead hang, bottom) -> 0, 30 deg (full flexion, top) -> 1.
        let inverted = 180.0 - raw_degrees;
        (inverted / (180.0 - 30.0)).clamp(0.0, 1.0)
    }
}

/// Resolves an `(exercise_type, grip_type)` pair to a profile instance.
///
/// The only place in the crate that branches on exercise type.
pub struct ExerciseProfileFactory;

impl ExerciseProfileFactory {
    pub fn create(
        exercise: ExerciseType,
        grip: Option<GripType>,
    ) -> CoreResult<Box<dyn ExerciseProfile>> {
        match (exercise, grip) {
            (ExerciseType::Pushup, None) => Ok(Box::new(PushupProfile::new())),
            (ExerciseType::Pushup, Some(_)) => Err(CoreError::input(
                "push-up profile does not accept a grip_type",
            )),
            (ExerciseType::Pullup, Some(grip)) => Ok(Box::new(PullupProfile::new(grip))),
            (ExerciseType::Pullup, None) => Err(CoreError::input(
                "pull-up profile requires a grip_type",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushup_profile_validates() {
        let profile = PushupProfile::new();
        assert!(profile.data().validate().is_ok());
    }

    #[test]
    fn pullup_profile_validates() {
        let profile = PullupProfile::new(GripType::Overhand);
        assert!(profile.data().validate().is_ok());
    }

    #[test]
    fn pushup_driver_normalization_endpoints() {
        let profile = PushupProfile::new();
        assert!((profile.normalize_driver(180.0) - 1.0).abs() < 1e-9);
        assert!((profile.normalize_driver(70.0) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn pullup_driver_normalization_is_inverted() {
        let profile = PullupProfile::new(GripType::Wide);
        assert!((profile.normalize_driver(180.0) - 0.0).abs() < 1e-9);
        assert!((profile.normalize_driver(30.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn factory_rejects_pushup_with_grip() {
        assert!(ExerciseProfileFactory::create(ExerciseType::Pushup, Some(GripType::Wide)).is_err());
    }

    #[test]
    fn factory_rejects_pullup_without_grip() {
        assert!(ExerciseProfileFactory::create(ExerciseType::Pullup, None).is_err());
    }
}
