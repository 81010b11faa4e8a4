//! Stage 7: DTW Scorer, optional.
//!
//! No direct teacher analog exists for band-limited time-series alignment;
//! this module is implemented from the contract directly, following the
//! same "plain data in, plain data out" shape as the other pipeline stages.

use std::collections::BTreeMap;

use ndarray::Array2;
use posecoach_models::{DtwResult, PhaseLabel, WorstJoint};

/// `α` in `score = exp(-α * normalized_cost)`, chosen so that a
/// reference-vs-reference run (`normalized_cost ≈ 0`) scores ≥ 0.95 and a
/// randomized-angle control (`normalized_cost` large) scores ≈ 0.1.
const DTW_ALPHA: f64 = 2.3;

/// One rep's feature matrix for one phase: rows are frames, columns are
/// joint-triple angles (degrees), matching both sequences' column count.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseRepFeatures {
    pub phase: PhaseLabel,
    pub user_frames: Vec<Vec<f64>>,
    pub reference_frames: Vec<Vec<f64>>,
    pub triple_names: Vec<String>,
}

/// Band-limited (Sakoe-Chiba) DTW distance between two multivariate
/// sequences, normalized by path length and feature dimensionality.
fn band_limited_dtw(a: &[Vec<f64>], b: &[Vec<f64>], band_frac: f64) -> f64 {
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return f64::INFINITY;
    }
    let dim = a[0].len().max(1);
    let band = ((n.max(m) as f64) * band_frac).ceil().max(1.0) as usize;

    let mut cost = Array2::<f64>::from_elem((n + 1, m + 1), f64::INFINITY);
    cost[[0, 0]] = 0.0;

    for i in 1..=n {
        let j_lo = i.saturating_sub(band).max(1);
        let j_hi = (i + band).min(m);
        for j in j_lo..=j_hi {
            let d = euclidean(&a[i - 1], &b[j - 1]);
            let min_prev = cost[[i - 1, j]].min(cost[[i, j - 1]]).min(cost[[i - 1, j - 1]]);
            cost[[i, j]] = d + min_prev;
        }
    }

    let path_len = (n + m) as f64;
    cost[[n, m]] / (path_len * dim as f64)
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Map a normalized DTW cost to a `[0,1]` similarity score.
fn cost_to_score(normalized_cost: f64) -> f64 {
    (-DTW_ALPHA * normalized_cost).exp().clamp(0.0, 1.0)
}

/// Run DTW per phase across the given rep-aligned feature sets and
/// aggregate into a `DtwResult`.
///
/// Returns `None` if there are no completed reps to compare, signaling
/// that the caller should set `dtw_active = false` without failing the
/// request.
pub fn score(reps: &[PhaseRepFeatures], band_frac: f64) -> Option<DtwResult> {
    if reps.is_empty() {
        return None;
    }

    let mut phase_scores: BTreeMap<PhaseLabel, (f64, usize)> = BTreeMap::new();
    let mut worst_by_triple: BTreeMap<String, f64> = BTreeMap::new();

    for rep in reps {
        let normalized_cost = band_limited_dtw(&rep.user_frames, &rep.reference_frames, band_frac);
        if !normalized_cost.is_finite() {
            continue;
        }
        let rep_score = cost_to_score(normalized_cost);
        let entry = phase_scores.entry(rep.phase).or_insert((0.0, 0));
        entry.0 += rep_score;
        entry.1 += 1;

        for (col, name) in rep.triple_names.iter().enumerate() {
            let mean_abs_delta = mean_abs_column_delta(&rep.user_frames, &rep.reference_frames, col);
            let slot = worst_by_triple.entry(name.clone()).or_insert(0.0);
            if mean_abs_delta > *slot {
                *slot = mean_abs_delta;
            }
        }
    }

    if phase_scores.is_empty() {
        return None;
    }

    let total_weight: f64 = phase_scores.values().map(|(_, n)| *n as f64).sum::<f64>().max(1.0);
    let overall_score = phase_scores.values().map(|(sum, _)| *sum).sum::<f64>() / total_weight;

    let phase_scores_out: BTreeMap<PhaseLabel, f64> =
        phase_scores.into_iter().map(|(phase, (sum, n))| (phase, sum / n as f64)).collect();

    let mut worst_joints: Vec<WorstJoint> = worst_by_triple
        .into_iter()
        .map(|(triple_name, mean_abs_delta_deg)| WorstJoint { triple_name, mean_abs_delta_deg })
        .collect();
    worst_joints.sort_by(|a, b| b.mean_abs_delta_deg.partial_cmp(&a.mean_abs_delta_deg).unwrap());
    worst_joints.truncate(4);

    Some(DtwResult { overall_score, phase_scores: phase_scores_out, worst_joints })
}

fn mean_abs_column_delta(a: &[Vec<f64>], b: &[Vec<f64>], col: usize) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    (0..n).map(|i| (a[i][col] - b[i][col]).abs()).sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rep(phase: PhaseLabel, user: Vec<Vec<f64>>, reference: Vec<Vec<f64>>) -> PhaseRepFeatures {
        PhaseRepFeatures { phase, user_frames: user, reference_frames: reference, triple_names: vec!["elbow".to_string()] }
    }

    #[test]
    fn identical_sequences_score_highly() {
        let frames = vec![vec![90.0], vec![100.0], vec![110.0], vec![120.0]];
        let reps = vec![rep(PhaseLabel::Ascending, frames.clone(), frames)];
        let result = score(&reps, 0.15).unwrap();
        assert!(result.overall_score >= 0.95, "got {}", result.overall_score);
    }

    #[test]
    fn reversed_sequence_scores_lower() {
        let frames = vec![vec![90.0], vec![100.0], vec![110.0], vec![120.0]];
        let mut reversed = frames.clone();
        reversed.reverse();
        let same = vec![rep(PhaseLabel::Ascending, frames.clone(), frames.clone())];
        let diff = vec![rep(PhaseLabel::Ascending, frames, reversed)];
        let same_score = score(&same, 0.15).unwrap().overall_score;
        let diff_score = score(&diff, 0.15).unwrap().overall_score;
        assert!(diff_score < same_score);
    }

    #[test]
    fn no_reps_yields_none() {
        assert!(score(&[], 0.15).is_none());
    }
}
