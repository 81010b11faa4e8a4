//! Stage 3: Signal Conditioner.
//!
//! Normalizes raw pixel keypoints to `[0,1]` (a no-op here since the pose
//! detector already emits normalized coordinates — see module note below),
//! smooths each joint's time series independently, imputes short gaps, and
//! computes the angle series the rest of the pipeline consumes.

use posecoach_models::{ExerciseProfileData, Joint, KeypointSet, ALL_JOINTS};

use crate::angles::{compute_series, AngleSeries};
use crate::smoothing::{impute_gaps, moving_average_gapped};

/// Per-joint smoothed `(x, y)` series plus per-triple angle series, the
/// product of Stage 3.
pub struct ConditionedSignal {
    pub smoothed_keypoints: Vec<KeypointSet>,
    pub angle_series: Vec<AngleSeries>,
}

/// Smooths each joint's `x`/`y` coordinate series independently (missing
/// samples are gaps, never smoothed across), then computes one angle
/// series per triple declared in the exercise profile.
///
/// The pose detector already emits `(x, y)` normalized to `[0,1]`, so the
/// pixel/`(W,H)` normalization step happens at decode time in Stage 2
/// rather than here; this stage starts from already-normalized coordinates.
pub fn condition(
    raw_keypoints: &[KeypointSet],
    profile: &ExerciseProfileData,
    smoothing_window: usize,
    max_impute_gap: usize,
    min_visibility: f64,
) -> ConditionedSignal {
    let smoothed_keypoints = smooth_keypoint_series(raw_keypoints, smoothing_window, min_visibility);

    let angle_series = profile
        .triples
        .iter()
        .map(|triple| {
            let raw =
                compute_series(&triple.name, &smoothed_keypoints, triple.a, triple.b, triple.c, min_visibility);
            let imputed = impute_gaps(&raw.values, max_impute_gap);
            AngleSeries::new(triple.name.clone(), imputed)
        })
        .collect();

    ConditionedSignal { smoothed_keypoints, angle_series }
}

fn smooth_keypoint_series(raw: &[KeypointSet], window: usize, min_visibility: f64) -> Vec<KeypointSet> {
    if raw.is_empty() {
        return Vec::new();
    }

    let mut per_joint_x = Vec::with_capacity(ALL_JOINTS.len());
    let mut per_joint_y = Vec::with_capacity(ALL_JOINTS.len());
    let mut per_joint_vis = Vec::with_capacity(ALL_JOINTS.len());

    for &joint in ALL_JOINTS.iter() {
        let xs: Vec<Option<f64>> = raw
            .iter()
            .map(|set| present_or_none(set, joint, min_visibility, |kp| kp.x))
            .collect();
        let ys: Vec<Option<f64>> = raw
            .iter()
            .map(|set| present_or_none(set, joint, min_visibility, |kp| kp.y))
            .collect();
        let vis: Vec<f64> = raw.iter().map(|set| set.get(joint).vis).collect();

        per_joint_x.push(moving_average_gapped(&xs, window));
        per_joint_y.push(moving_average_gapped(&ys, window));
        per_joint_vis.push(vis);
    }

    let mut out = vec![KeypointSet::all_missing(); raw.len()];
    for (j, &joint) in ALL_JOINTS.iter().enumerate() {
        for (frame_idx, slot) in out.iter_mut().enumerate() {
            let vis = per_joint_vis[j][frame_idx];
            let (x, y) = match (per_joint_x[j][frame_idx], per_joint_y[j][frame_idx]) {
                (Some(x), Some(y)) => (x, y),
                _ => (0.0, 0.0),
            };
            slot.set(joint, posecoach_models::Keypoint::new(x, y, vis));
        }
    }
    out
}

fn present_or_none(
    set: &KeypointSet,
    joint: Joint,
    min_visibility: f64,
    f: impl Fn(posecoach_models::Keypoint) -> f64,
) -> Option<f64> {
    let kp = set.get(joint);
    if kp.is_present(min_visibility) {
        Some(f(kp))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecoach_models::{ExerciseType, JointTriple, Keypoint, PhaseLabel, Rule};

    fn profile() -> ExerciseProfileData {
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
            rules: Vec::<Rule>::new(),
            scored_phases: vec![PhaseLabel::Top],
        }
    }

    #[test]
    fn condition_produces_one_series_per_triple() {
        let mut set = KeypointSet::all_missing();
        set.set(Joint::LeftShoulder, Keypoint::new(0.0, 1.0, 1.0));
        set.set(Joint::LeftElbow, Keypoint::new(0.0, 0.0, 1.0));
        set.set(Joint::LeftWrist, Keypoint::new(1.0, 0.0, 1.0));
        let raw = vec![set.clone(), set.clone(), set];

        let signal = condition(&raw, &profile(), 3, 3, 0.3);
        assert_eq!(signal.angle_series.len(), 1);
        assert_eq!(signal.angle_series[0].name, "elbow");
        assert!(signal.angle_series[0].values.iter().all(|v| v.is_some()));
    }

    #[test]
    fn all_missing_input_stays_missing_after_conditioning() {
        let raw = vec![KeypointSet::all_missing(); 5];
        let signal = condition(&raw, &profile(), 3, 3, 0.3);
        assert!(signal.angle_series[0].values.iter().all(|v| v.is_none()));
    }
}
