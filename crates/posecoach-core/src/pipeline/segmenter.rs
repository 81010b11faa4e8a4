//! Stage 4: Activity Segmenter.
//!
//! The hysteresis state machine mirrors `SilenceRemover`'s
//! `InSpeech`/`InSilence` shape, with a frame-count hysteresis in place of
//! `SilenceRemover`'s duration-based one (the segmenter runs on a fixed
//! sampling rate, so frame counts and durations are interchangeable via
//! `extract_fps`), and an explicit `active`/`resting` pair of states rather
//! than `speech`/`silence`.

use posecoach_models::{FilteringInfo, FilteringMethod};

use crate::smoothing::mean_present;

/// Binary per-frame activity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLabel {
    Active,
    Resting,
}

enum State {
    Resting { below_run: usize },
    Active { above_run: usize },
}

/// Hysteresis state machine converting a per-frame motion-energy stream
/// into active/resting labels.
struct HysteresisSegmenter {
    threshold: f64,
    n_on: usize,
    n_off: usize,
    state: State,
}

impl HysteresisSegmenter {
    fn new(threshold: f64, n_on: usize, n_off: usize) -> Self {
        Self { threshold, n_on, n_off, state: State::Resting { below_run: 0 } }
    }

    fn ingest(&mut self, energy: f64) -> ActivityLabel {
        let above = energy > self.threshold;
        match &mut self.state {
            State::Resting { below_run } => {
                if above {
                    *below_run = 0;
                    // Count consecutive above-threshold frames across the
                    // rest -> active transition window.
                    self.state = State::Active { above_run: 1 };
                    if self.n_on <= 1 {
                        ActivityLabel::Active
                    } else {
                        ActivityLabel::Resting
                    }
                } else {
                    *below_run += 1;
                    ActivityLabel::Resting
                }
            }
            State::Active { above_run } => {
                if above {
                    *above_run += 1;
                    if *above_run >= self.n_on {
                        ActivityLabel::Active
                    } else {
                        ActivityLabel::Resting
                    }
                } else {
                    // Start counting consecutive below-threshold frames;
                    // stay active until n_off is reached.
                    let was_confirmed = *above_run >= self.n_on;
                    self.state = State::Resting { below_run: 1 };
                    if was_confirmed && self.n_off > 1 {
                        ActivityLabel::Active
                    } else {
                        ActivityLabel::Resting
                    }
                }
            }
        }
    }
}

/// Motion energy at frame `i`: sum of absolute differences of the driver
/// angle between `i` and its ±`k` neighbors.
fn motion_energy(driver: &[Option<f64>], i: usize, k: usize) -> f64 {
    let lo = i.saturating_sub(k);
    let hi = (i + k).min(driver.len() - 1);
    let Some(center) = driver[i] else { return 0.0 };
    (lo..=hi)
        .filter(|&j| j != i)
        .filter_map(|j| driver[j].map(|v| (v - center).abs()))
        .sum()
}

/// A heuristic fallback classifier used when the rule-based energy stream
/// yields an implausible active fraction. It scores
/// each frame from normalized driver variability in a local window rather
/// than a second learned model, since nothing in the contract mandates
/// one; this is a deliberately simple logistic-style scorer over the same
/// motion-energy feature.
fn classifier_fallback(driver: &[Option<f64>], k: usize) -> Vec<ActivityLabel> {
    let energies: Vec<f64> = (0..driver.len()).map(|i| motion_energy(driver, i, k)).collect();
    let mean = mean_present(&energies.iter().map(|&e| Some(e)).collect::<Vec<_>>());
    driver
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if energies[i] >= mean * 0.5 {
                ActivityLabel::Active
            } else {
                ActivityLabel::Resting
            }
        })
        .collect()
}

/// Result of segmenting one video's driver-angle stream.
pub struct SegmentationResult {
    pub labels: Vec<ActivityLabel>,
    pub filtering: FilteringInfo,
}

/// Segment a driver-angle series into active/resting frames.
pub fn segment(driver: &[Option<f64>], threshold: f64, n_on: usize, n_off: usize, k: usize) -> SegmentationResult {
    let total_frames = driver.len();
    if total_frames == 0 {
        return SegmentationResult {
            labels: Vec::new(),
            filtering: FilteringInfo {
                method: FilteringMethod::RuleBased,
                reason: None,
                total_frames: 0,
                active_frames: 0,
                rest_frames: 0,
            },
        };
    }

    let mut segmenter = HysteresisSegmenter::new(threshold, n_on, n_off);
    let rule_labels: Vec<ActivityLabel> = (0..total_frames)
        .map(|i| segmenter.ingest(motion_energy(driver, i, k)))
        .collect();

    let active_count = rule_labels.iter().filter(|l| matches!(l, ActivityLabel::Active)).count();
    let active_fraction = active_count as f64 / total_frames as f64;

    let (labels, method, reason) = if active_fraction < 0.30 {
        (
            classifier_fallback(driver, k),
            FilteringMethod::ClassifierFallback,
            Some(format!(
                "rule-based active fraction {active_fraction:.2} below 0.30 (likely static camera)"
            )),
        )
    } else if active_fraction > 0.95 {
        (
            classifier_fallback(driver, k),
            FilteringMethod::ClassifierFallback,
            Some(format!(
                "rule-based active fraction {active_fraction:.2} above 0.95 (likely noisy driver)"
            )),
        )
    } else {
        (rule_labels, FilteringMethod::RuleBased, None)
    };

    let active_frames = labels.iter().filter(|l| matches!(l, ActivityLabel::Active)).count();
    let rest_frames = total_frames - active_frames;

    SegmentationResult {
        labels,
        filtering: FilteringInfo { method, reason, total_frames, active_frames, rest_frames },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_driver_is_all_resting() {
        let driver: Vec<Option<f64>> = vec![Some(90.0); 40];
        let result = segment(&driver, 1.5, 3, 5, 3);
        assert!(result.filtering.active_frames < result.filtering.total_frames);
    }

    #[test]
    fn oscillating_driver_is_mostly_active() {
        let driver: Vec<Option<f64>> = (0..60)
            .map(|i| Some(90.0 + 60.0 * ((i as f64) * 0.5).sin()))
            .collect();
        let result = segment(&driver, 1.5, 3, 5, 3);
        assert!(result.filtering.active_frames > 0);
    }

    #[test]
    fn empty_series_yields_empty_result() {
        let result = segment(&[], 1.5, 3, 5, 3);
        assert_eq!(result.filtering.total_frames, 0);
        assert!(result.labels.is_empty());
    }
}
