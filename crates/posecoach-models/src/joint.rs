//! The fixed 17-joint COCO-style keypoint vocabulary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single body joint, left/right distinguished.
///
/// The order here is the canonical iteration order used when a keypoint set
/// is serialized as an array rather than a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

/// All 17 joints in canonical order.
pub const ALL_JOINTS: [Joint; 17] = [
    Joint::Nose,
    Joint::LeftEye,
    Joint::RightEye,
    Joint::LeftEar,
    Joint::RightEar,
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::LeftElbow,
    Joint::RightElbow,
    Joint::LeftWrist,
    Joint::RightWrist,
    Joint::LeftHip,
    Joint::RightHip,
    Joint::LeftKnee,
    Joint::RightKnee,
    Joint::LeftAnkle,
    Joint::RightAnkle,
];

impl Joint {
    /// Index into `ALL_JOINTS`, used as the array slot for a keypoint set.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: usize) -> Option<Joint> {
        ALL_JOINTS.get(idx).copied()
    }
}

/// Default minimum detector confidence for a joint to be treated as
/// present for geometry, used where a caller has no `Config` in hand
/// (e.g. unit tests). Pipeline code should prefer `Config::min_visibility`.
///
/// Below this, the joint is retained for provenance but excluded from angle
/// computation.
pub const MIN_VISIBILITY: f64 = 0.3;

/// A single detected joint position, image-normalized to `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub vis: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, vis: f64) -> Self {
        Self { x, y, vis }
    }

    /// An all-missing keypoint: zero confidence, origin position.
    pub fn missing() -> Self {
        Self { x: 0.0, y: 0.0, vis: 0.0 }
    }

    /// Whether this joint should be treated as present for geometry, given
    /// the run's configured `min_visibility` threshold.
    pub fn is_present(&self, min_visibility: f64) -> bool {
        self.vis >= min_visibility
    }
}

/// The per-frame mapping from joint to detected position.
///
/// Every frame from stage 2 onward carries exactly one `KeypointSet`,
/// possibly all-missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KeypointSet {
    points: [Keypoint; 17],
}

impl KeypointSet {
    /// A keypoint set where every joint is missing (no human detected).
    pub fn all_missing() -> Self {
        Self { points: [Keypoint::missing(); 17] }
    }

    pub fn get(&self, joint: Joint) -> Keypoint {
        self.points[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, kp: Keypoint) {
        self.points[joint.index()] = kp;
    }

    /// True if every joint is missing at the given visibility threshold.
    pub fn is_all_missing(&self, min_visibility: f64) -> bool {
        self.points.iter().all(|k| !k.is_present(min_visibility))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Keypoint)> + '_ {
        ALL_JOINTS.iter().map(move |&j| (j, self.get(j)))
    }
}

impl Default for KeypointSet {
    fn default() -> Self {
        Self::all_missing()
    }
}

/// Builder for constructing a `KeypointSet` from individual joint observations.
#[derive(Debug, Clone, Default)]
pub struct KeypointSetBuilder {
    set: KeypointSet,
}

impl KeypointSetBuilder {
    pub fn new() -> Self {
        Self { set: KeypointSet::all_missing() }
    }

    pub fn with(mut self, joint: Joint, kp: Keypoint) -> Self {
        self.set.set(joint, kp);
        self
    }

    pub fn build(self) -> KeypointSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_missing_has_zero_vis_everywhere() {
        let set = KeypointSet::all_missing();
        assert!(set.is_all_missing(MIN_VISIBILITY));
        for (_, kp) in set.iter() {
            assert_eq!(kp.vis, 0.0);
        }
    }

    #[test]
    fn builder_sets_one_joint() {
        let set = KeypointSetBuilder::new()
            .with(Joint::LeftElbow, Keypoint::new(0.4, 0.5, 0.9))
            .build();
        assert!(!set.is_all_missing(MIN_VISIBILITY));
        assert_eq!(set.get(Joint::LeftElbow).vis, 0.9);
        assert_eq!(set.get(Joint::RightElbow).vis, 0.0);
    }

    #[test]
    fn joint_index_roundtrips() {
        for &j in ALL_JOINTS.iter() {
            assert_eq!(Joint::from_index(j.index()), Some(j));
        }
    }
}
