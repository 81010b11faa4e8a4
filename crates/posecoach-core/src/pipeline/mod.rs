//! Pipeline orchestration: the `analyze()` entry point wiring stages 1–7
//! together.

pub mod conditioner;
pub mod dtw;
pub mod evaluator;
pub mod extractor;
pub mod phase_engine;
pub mod pose_detector;
pub mod segmenter;

use std::path::Path;

use tracing::{info, warn};

use posecoach_models::{
    AnalysisReport, Config, ExerciseType, FilteringInfo, Frame, Grade, GripType, PhaseLabel,
};

use crate::angles::AngleSeries;
use crate::cancel::CancelToken;
use crate::error::{CoreError, CoreResult};
use crate::profiles::{ExerciseProfile, ExerciseProfileFactory};
use conditioner::condition;
use dtw::PhaseRepFeatures;
use extractor::FrameExtractor;
use pose_detector::PoseDetector;
use segmenter::ActivityLabel;

/// The single entry point into the analysis core.
///
/// `reference_path`, when present, enables Stage 7 (DTW). A reference is
/// analyzed the same way as the primary video, recursively, but DTW is
/// never run on the reference's own reference (nesting depth 1).
pub struct AnalysisRequest<'a> {
    pub video_path: &'a Path,
    pub thumbnail_dir: &'a Path,
    pub exercise_type: ExerciseType,
    pub grip_type: Option<GripType>,
    pub reference_path: Option<&'a Path>,
    pub reference_thumbnail_dir: Option<&'a Path>,
}

/// Runs the full seven-stage pipeline for one request.
pub struct Analyzer<'a> {
    config: &'a Config,
    pose_detector: &'a PoseDetector,
}

impl<'a> Analyzer<'a> {
    pub fn new(config: &'a Config, pose_detector: &'a PoseDetector) -> Self {
        Self { config, pose_detector }
    }

    pub async fn analyze(&self, request: &AnalysisRequest<'_>, cancel: &CancelToken) -> CoreResult<AnalysisReport> {
        self.config
            .validate()
            .map_err(|e| CoreError::input(format!("invalid config: {e}")))?;

        let profile = ExerciseProfileFactory::create(request.exercise_type, request.grip_type)?;

        let user_run = self.run_single(request.video_path, request.thumbnail_dir, profile.as_ref(), cancel).await?;

        let dtw_result = if let (Some(ref_path), Some(ref_thumb_dir)) =
            (request.reference_path, request.reference_thumbnail_dir)
        {
            match self.run_single(ref_path, ref_thumb_dir, profile.as_ref(), cancel).await {
                Ok(reference_run) if reference_run.exercise_count > 0 => {
                    build_dtw_reps(&user_run, &reference_run)
                        .and_then(|reps| dtw::score(&reps, self.config.dtw_band_frac))
                }
                Ok(_) => {
                    info!("reference video completed zero reps; skipping DTW");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "reference analysis failed; skipping DTW");
                    None
                }
            }
        } else {
            None
        };

        assemble(request.video_path, request.exercise_type, request.grip_type, user_run, dtw_result, self.config)
    }

    /// Run stages 1–6 on a single video, returning the intermediate state
    /// needed for both report assembly and (for the primary video) DTW
    /// feature construction.
    async fn run_single(
        &self,
        video_path: &Path,
        thumbnail_dir: &Path,
        profile: &dyn ExerciseProfile,
        cancel: &CancelToken,
    ) -> CoreResult<SingleRunResult> {
        let extractor = FrameExtractor::new(self.config);
        let (video_info, mut frames) = extractor.extract(video_path, thumbnail_dir, cancel).await?;
        cancel.check()?;

        let raw_keypoints = self.pose_detector.detect_all(&frames, self.config, cancel)?;
        let no_detection_count = raw_keypoints
            .iter()
            .filter(|k| pose_detector::is_no_detection(k, self.config.min_visibility))
            .count();
        if !frames.is_empty() && no_detection_count * 5 > frames.len() * 4 {
            return Err(CoreError::detection(format!(
                "{no_detection_count}/{} frames had no detection",
                frames.len()
            )));
        }
        for (frame, kp) in frames.iter_mut().zip(raw_keypoints.iter()) {
            frame.keypoints = Some(kp.clone());
        }
        cancel.check()?;

        let conditioned = condition(
            &raw_keypoints,
            profile.data(),
            self.config.smoothing_window,
            self.config.max_impute_gap,
            self.config.min_visibility,
        );

        let driver_triple = profile
            .data()
            .driver_triple()
            .ok_or_else(|| CoreError::input("profile missing driver triple"))?;
        let driver_series = conditioned
            .angle_series
            .iter()
            .find(|s| s.name == driver_triple.name)
            .ok_or_else(|| CoreError::input("driver triple has no computed angle series"))?;

        // The segmenter's motion-energy threshold is expressed in the
        // driver's native degrees/sample, so it runs on the raw (still
        // pre-normalization) angle series; `normalize_driver`'s [0,1]
        // output is reserved for the phase engine's d_top/d_bot comparison.
        let segmentation = segmenter::segment(
            &driver_series.values,
            self.config.motion_threshold,
            self.config.hysteresis_on,
            self.config.hysteresis_off,
            self.config.motion_window,
        );

        let normalized_driver: Vec<Option<f64>> =
            driver_series.values.iter().map(|v| v.map(|raw| profile.normalize_driver(raw))).collect();
        cancel.check()?;

        let active_indices: Vec<usize> = segmentation
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l, ActivityLabel::Active))
            .map(|(i, _)| i)
            .collect();

        if active_indices.is_empty() {
            return Ok(SingleRunResult {
                video_info,
                frames,
                angle_series: conditioned.angle_series,
                active_indices,
                phases: Vec::new(),
                exercise_count: 0,
                filtering: segmentation.filtering,
                warning: Some("insufficient motion: no active frames found".to_string()),
            });
        }

        let active_driver: Vec<Option<f64>> = active_indices.iter().map(|&i| normalized_driver[i]).collect();
        let active_timestamps: Vec<f64> = active_indices.iter().map(|&i| frames[i].timestamp).collect();

        let phase_result = phase_engine::run(
            &active_driver,
            &active_timestamps,
            self.config.d_top,
            self.config.d_bot,
            self.config.t_min_rep,
        );

        let warning = if phase_result.exercise_count == 0 {
            Some("insufficient motion: no completed repetitions".to_string())
        } else {
            None
        };

        Ok(SingleRunResult {
            video_info,
            frames,
            angle_series: conditioned.angle_series,
            active_indices,
            phases: phase_result.phases,
            exercise_count: phase_result.exercise_count,
            filtering: segmentation.filtering,
            warning,
        })
    }
}

struct SingleRunResult {
    video_info: extractor::VideoInfo,
    frames: Vec<Frame>,
    angle_series: Vec<AngleSeries>,
    active_indices: Vec<usize>,
    phases: Vec<PhaseLabel>,
    exercise_count: u32,
    filtering: FilteringInfo,
    warning: Option<String>,
}

/// Assemble `PhaseRepFeatures` for DTW by pairing each of the user's
/// completed rep cycles, ordinally, with the matching rep cycle in the
/// reference stream, one `PhaseRepFeatures` per scored phase per paired rep.
/// Both streams were produced by the same deterministic phase engine, so
/// ordinal pairing (user rep 0 against reference rep 0, and so on) lines
/// up like-with-like without needing a separate alignment pass.
fn build_dtw_reps(user: &SingleRunResult, reference: &SingleRunResult) -> Option<Vec<PhaseRepFeatures>> {
    if user.phases.is_empty() || reference.phases.is_empty() {
        return None;
    }
    let triple_names: Vec<String> = user.angle_series.iter().map(|s| s.name.clone()).collect();

    let user_rep_ids = rep_ids(&user.phases);
    let reference_rep_ids = rep_ids(&reference.phases);
    let paired_reps = (user_rep_ids.last().copied().unwrap_or(0) + 1)
        .min(reference_rep_ids.last().copied().unwrap_or(0) + 1);

    let mut reps = Vec::new();
    for rep in 0..paired_reps {
        for &phase in PhaseLabel::ALL.iter().filter(|p| p.is_scored()) {
            let user_frames = phase_feature_matrix(user, &user_rep_ids, rep, phase);
            let reference_frames = phase_feature_matrix(reference, &reference_rep_ids, rep, phase);
            if user_frames.is_empty() || reference_frames.is_empty() {
                continue;
            }
            reps.push(PhaseRepFeatures {
                phase,
                user_frames,
                reference_frames,
                triple_names: triple_names.clone(),
            });
        }
    }
    if reps.is_empty() {
        None
    } else {
        Some(reps)
    }
}

/// Assigns each frame's position in `phases` to a rep-cycle ordinal: a new
/// rep begins at the first `descending` frame following a `top`, so rep 0
/// covers the leading `ready` run through the first `top`, rep 1 the next
/// `descending`-through-`top` span, and so on.
fn rep_ids(phases: &[PhaseLabel]) -> Vec<usize> {
    let mut ids = Vec::with_capacity(phases.len());
    let mut rep = 0usize;
    let mut prev: Option<PhaseLabel> = None;
    for &p in phases {
        if p == PhaseLabel::Descending && prev == Some(PhaseLabel::Top) {
            rep += 1;
        }
        ids.push(rep);
        prev = Some(p);
    }
    ids
}

fn phase_feature_matrix(run: &SingleRunResult, rep_ids: &[usize], rep: usize, phase: PhaseLabel) -> Vec<Vec<f64>> {
    run.active_indices
        .iter()
        .zip(run.phases.iter())
        .zip(rep_ids.iter())
        .filter(|((_, &p), &r)| p == phase && r == rep)
        .map(|((&frame_pos, _), _)| {
            run.angle_series
                .iter()
                .map(|series| series.values.get(frame_pos).copied().flatten().unwrap_or(0.0))
                .collect()
        })
        .collect()
}

fn assemble(
    video_path: &Path,
    exercise_type: ExerciseType,
    grip_type: Option<GripType>,
    run: SingleRunResult,
    dtw_result: Option<posecoach_models::DtwResult>,
    config: &Config,
) -> CoreResult<AnalysisReport> {
    let total_frames = run.frames.len();
    let selected_frame_indices: Vec<u32> = run.active_indices.iter().map(|&i| run.frames[i].frame_idx).collect();

    // Re-derive the profile purely to evaluate: cheap, avoids threading the
    // trait object through assembly.
    let profile_data = profile_from(exercise_type, grip_type)?;

    let frame_scores = evaluator::evaluate(
        &selected_frame_indices,
        &run.phases,
        &run.angle_series,
        &profile_data,
        config.soft_deg,
        config.hard_deg,
    );

    let error_frames: Vec<_> = frame_scores.iter().filter(|f| !f.errors.is_empty()).cloned().collect();
    let (avg_score, phase_scores) = evaluator::aggregate(&frame_scores);

    let dtw_active = dtw_result.is_some();
    let combined = match &dtw_result {
        Some(dtw) => avg_score * 0.7 + dtw.overall_score * 0.3,
        None => avg_score,
    };
    let grade = Grade::from_combined(combined);

    Ok(AnalysisReport {
        video_name: video_path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
        exercise_type,
        grip_type,
        duration: run.video_info.duration,
        fps: run.video_info.fps,
        total_frames,
        exercise_count: run.exercise_count,
        frame_scores,
        error_frames,
        keypoints: run.frames,
        selected_frame_indices,
        filtering: run.filtering,
        dtw_active,
        dtw_result,
        avg_score,
        phase_scores,
        grade,
        warning: run.warning,
    })
}

fn profile_from(exercise_type: ExerciseType, grip_type: Option<GripType>) -> CoreResult<posecoach_models::ExerciseProfileData> {
    Ok(ExerciseProfileFactory::create(exercise_type, grip_type)?.data().clone())
}
