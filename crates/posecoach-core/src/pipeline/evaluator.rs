//! Stage 6: Posture Evaluator.

use std::collections::BTreeMap;

use posecoach_models::{ExerciseProfileData, FrameScore, PhaseLabel, RuleDetail, RuleStatus};

use crate::angles::AngleSeries;

struct RuleOutcome {
    rule_name: String,
    status: RuleStatus,
    contribution: f64,
    weight: f64,
    message: String,
}

/// Score one rule against one frame's angle value.
fn score_rule(theta: f64, target_lo: f64, target_hi: f64, soft_deg: f64, hard_deg: f64) -> (RuleStatus, f64) {
    if theta >= target_lo && theta <= target_hi {
        return (RuleStatus::Ok, 1.0);
    }
    let delta = (theta - target_lo).abs().min((theta - target_hi).abs());
    let status = if delta <= soft_deg { RuleStatus::Warning } else { RuleStatus::Error };
    let contribution = (1.0 - delta / hard_deg).clamp(0.0, 1.0);
    (status, contribution)
}

/// Evaluate every applicable rule on one frame, returning the score and
/// per-rule details.
fn evaluate_frame(
    angles_by_triple: &BTreeMap<&str, Option<f64>>,
    phase: PhaseLabel,
    profile: &ExerciseProfileData,
    soft_deg: f64,
    hard_deg: f64,
) -> (f64, Vec<String>, BTreeMap<String, RuleDetail>) {
    let mut outcomes = Vec::new();
    let mut details = BTreeMap::new();

    for rule in &profile.rules {
        if !rule.applies_to(phase) {
            continue;
        }
        let Some(Some(theta)) = angles_by_triple.get(rule.triple.as_str()) else {
            continue; // missing angle: rule skipped, not zeroed.
        };
        let (status, contribution) = score_rule(*theta, rule.target_lo, rule.target_hi, soft_deg, hard_deg);
        let message = match status {
            RuleStatus::Ok => String::new(),
            RuleStatus::Warning => rule.warning_message.clone(),
            RuleStatus::Error => rule.error_message.clone(),
        };
        details.insert(
            rule.name.clone(),
            RuleDetail { status, value: format!("{theta:.1} deg"), feedback: message.clone() },
        );
        outcomes.push(RuleOutcome {
            rule_name: rule.name.clone(),
            status,
            contribution,
            weight: rule.weight,
            message,
        });
    }

    if outcomes.is_empty() {
        return (0.0, Vec::new(), details);
    }

    let weight_sum: f64 = outcomes.iter().map(|o| o.weight).sum();
    let score = if weight_sum > 0.0 {
        outcomes.iter().map(|o| o.weight * o.contribution).sum::<f64>() / weight_sum
    } else {
        0.0
    };

    // Errors in descending order of w_i * (1 - c_i), deduplicated per frame
    //.
    let mut faulty: Vec<&RuleOutcome> = outcomes
        .iter()
        .filter(|o| !matches!(o.status, RuleStatus::Ok))
        .collect();
    faulty.sort_by(|a, b| {
        let sa = a.weight * (1.0 - a.contribution);
        let sb = b.weight * (1.0 - b.contribution);
        sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen = std::collections::HashSet::new();
    let errors: Vec<String> = faulty
        .into_iter()
        .filter(|o| seen.insert(o.rule_name.clone()))
        .map(|o| o.message.clone())
        .filter(|m| !m.is_empty())
        .collect();

    (score, errors, details)
}

/// Score every active, in-phase frame.
pub fn evaluate(
    frame_indices: &[u32],
    phases: &[PhaseLabel],
    angle_series: &[AngleSeries],
    profile: &ExerciseProfileData,
    soft_deg: f64,
    hard_deg: f64,
) -> Vec<FrameScore> {
    assert_eq!(frame_indices.len(), phases.len());

    let mut scores = Vec::new();
    for (&frame_idx, &phase) in frame_indices.iter().zip(phases.iter()) {
        if !phase.is_scored() {
            continue;
        }
        // `frame_idx` is the position in the full (pre-segmentation) frame
        // and angle-series sequence, since Stage 1 assigns indices by
        // enumeration order and no stage reorders or drops frames after
        // extraction.
        let angles_by_triple: BTreeMap<&str, Option<f64>> = angle_series
            .iter()
            .map(|series| (series.name.as_str(), series.values.get(frame_idx as usize).copied().flatten()))
            .collect();

        let (score, errors, details) = evaluate_frame(&angles_by_triple, phase, profile, soft_deg, hard_deg);
        scores.push(FrameScore { frame_idx, phase, score, errors, details });
    }
    scores
}

/// `avg_score` and per-phase means over `frame_scores`.
pub fn aggregate(frame_scores: &[FrameScore]) -> (f64, BTreeMap<PhaseLabel, f64>) {
    if frame_scores.is_empty() {
        return (0.0, BTreeMap::new());
    }
    let avg_score = frame_scores.iter().map(|f| f.score).sum::<f64>() / frame_scores.len() as f64;

    let mut by_phase: BTreeMap<PhaseLabel, (f64, usize)> = BTreeMap::new();
    for fs in frame_scores {
        let entry = by_phase.entry(fs.phase).or_insert((0.0, 0));
        entry.0 += fs.score;
        entry.1 += 1;
    }
    let phase_scores = by_phase.into_iter().map(|(phase, (sum, n))| (phase, sum / n as f64)).collect();

    (avg_score, phase_scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecoach_models::{ExerciseType, Joint, JointTriple, Rule};

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
            rules: vec![Rule {
                name: "elbow_extension".to_string(),
                phases: vec![PhaseLabel::Top],
                triple: "elbow".to_string(),
                target_lo: 160.0,
                target_hi: 180.0,
                weight: 1.0,
                warning_message: "warn".to_string(),
                error_message: "err".to_string(),
            }],
            scored_phases: vec![PhaseLabel::Top],
        }
    }

    #[test]
    fn on_target_angle_scores_perfectly() {
        let series = vec![AngleSeries::new("elbow", vec![Some(170.0)])];
        let scores = evaluate(&[0], &[PhaseLabel::Top], &series, &profile(), 8.0, 20.0);
        assert_eq!(scores.len(), 1);
        assert!((scores[0].score - 1.0).abs() < 1e-9);
        assert!(scores[0].errors.is_empty());
    }

    #[test]
    fn far_off_target_is_an_error_with_message() {
        let series = vec![AngleSeries::new("elbow", vec![Some(100.0)])];
        let scores = evaluate(&[0], &[PhaseLabel::Top], &series, &profile(), 8.0, 20.0);
        assert_eq!(scores[0].errors, vec!["err".to_string()]);
        assert!(scores[0].score < 1.0);
    }

    #[test]
    fn missing_angle_skips_rule_without_zeroing_score() {
        let series = vec![AngleSeries::new("elbow", vec![None])];
        let scores = evaluate(&[0], &[PhaseLabel::Top], &series, &profile(), 8.0, 20.0);
        assert_eq!(scores[0].score, 0.0);
        assert!(scores[0].details.is_empty());
    }

    #[test]
    fn unscored_phase_produces_no_frame_score() {
        let series = vec![AngleSeries::new("elbow", vec![Some(170.0)])];
        let scores = evaluate(&[0], &[PhaseLabel::Ready], &series, &profile(), 8.0, 20.0);
        assert!(scores.is_empty());
    }
}
