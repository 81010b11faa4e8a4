//! Angle-series computation from smoothed keypoint streams.

use posecoach_models::{Joint, KeypointSet};

/// The unsigned angle at `b`, between rays `b->a` and `b->c`, in degrees.
///
/// Returns `None` if any of the three joints is missing (`vis <
/// min_visibility`).
pub fn triple_angle(points: &KeypointSet, a: Joint, b: Joint, c: Joint, min_visibility: f64) -> Option<f64> {
    let pa = points.get(a);
    let pb = points.get(b);
    let pc = points.get(c);

    if !pa.is_present(min_visibility) || !pb.is_present(min_visibility) || !pc.is_present(min_visibility) {
        return None;
    }

    let (ax, ay) = (pa.x - pb.x, pa.y - pb.y);
    let (cx, cy) = (pc.x - pb.x, pc.y - pb.y);

    let dot = ax * cx + ay * cy;
    let mag_a = (ax * ax + ay * ay).sqrt();
    let mag_c = (cx * cx + cy * cy).sqrt();

    if mag_a < f64::EPSILON || mag_c < f64::EPSILON {
        return None;
    }

    let cos_theta = (dot / (mag_a * mag_c)).clamp(-1.0, 1.0);
    Some(cos_theta.acos().to_degrees())
}

/// One named angle series over a run of frames, aligned by index with the
/// frame list it was computed from. Entries are `None` where the underlying
/// triple was not present after imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl AngleSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self { name: name.into(), values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compute the raw (pre-imputation) angle series for one triple across a
/// sequence of keypoint sets.
pub fn compute_series(
    name: &str,
    keypoints: &[KeypointSet],
    a: Joint,
    b: Joint,
    c: Joint,
    min_visibility: f64,
) -> AngleSeries {
    let values = keypoints.iter().map(|kp| triple_angle(kp, a, b, c, min_visibility)).collect();
    AngleSeries::new(name.to_string(), values)
}

/// Joint validity check against the configured visibility cutoff, exposed
/// for the conditioner's per-joint series construction.
pub fn joint_present(points: &KeypointSet, joint: Joint, min_visibility: f64) -> bool {
    points.get(joint).vis >= min_visibility
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecoach_models::{Keypoint, MIN_VISIBILITY};

    fn kp(points: &[(Joint, f64, f64)]) -> KeypointSet {
        let mut set = KeypointSet::default();
        for &(j, x, y) in points {
            set.set(j, Keypoint::new(x, y, 1.0));
        }
        set
    }

    #[test]
    fn right_angle_is_90_degrees() {
        // A at (0,1), B at (0,0), C at (1,0): rays (0,1) and (1,0) are orthogonal.
        let set = kp(&[
            (Joint::LeftShoulder, 0.0, 1.0),
            (Joint::LeftElbow, 0.0, 0.0),
            (Joint::LeftWrist, 1.0, 0.0),
        ]);
        let angle = triple_angle(&set, Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist, MIN_VISIBILITY).unwrap();
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn straight_line_is_180_degrees() {
        let set = kp(&[
            (Joint::LeftShoulder, -1.0, 0.0),
            (Joint::LeftElbow, 0.0, 0.0),
            (Joint::LeftWrist, 1.0, 0.0),
        ]);
        let angle = triple_angle(&set, Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist, MIN_VISIBILITY).unwrap();
        assert!((angle - 180.0).abs() < 1e-6);
    }

    #[test]
    fn missing_joint_yields_none() {
        let set = kp(&[(Joint::LeftElbow, 0.0, 0.0), (Joint::LeftWrist, 1.0, 0.0)]);
        assert!(triple_angle(&set, Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist, MIN_VISIBILITY).is_none());
    }
}
