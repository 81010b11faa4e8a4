//! Pipeline configuration.
//!
//! The core must not depend on any global configuration; every knob that
//! affects an analysis run travels in this record. Mirrors the shape of
//! `IntelligentCropConfig`: a flat, serde-friendly struct with a sensible
//! `Default` plus a handful of named presets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// All tunable knobs for a single `analyze()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    /// Frame sampling rate in Hz. Range `1..=30`.
    pub extract_fps: u32,

    /// Pose inference batch size. Must be `>= 1`.
    pub batch_size: usize,

    /// Moving filter width in samples. Must be `>= 1`.
    pub smoothing_window: usize,

    /// Activity-energy threshold in degrees/sample.
    pub motion_threshold: f64,

    /// Consecutive above-threshold frames required for rest -> active.
    pub hysteresis_on: usize,

    /// Consecutive below-threshold frames required for active -> rest.
    pub hysteresis_off: usize,

    /// Normalized driver value above which a frame counts as "top of rep".
    pub d_top: f64,

    /// Normalized driver value below which a frame counts as "bottom of rep".
    pub d_bot: f64,

    /// Minimum separation between extrema, in seconds, to suppress
    /// spurious double-counts.
    pub t_min_rep: f64,

    /// Soft-scoring band width in degrees.
    pub soft_deg: f64,

    /// Hard-scoring band width in degrees.
    pub hard_deg: f64,

    /// Sakoe-Chiba band width as a fraction of the longer sequence length
    ///.
    pub dtw_band_frac: f64,

    /// Minimum detector confidence for a joint to be treated as present
    ///. Joints below this are retained for provenance only.
    pub min_visibility: f64,

    /// Maximum gap length, in samples, that linear imputation will fill
    ///.
    pub max_impute_gap: usize,

    /// Half-width, in frames, of the motion-energy window.
    pub motion_window: usize,

    /// Below this active-frame fraction, the activity segmenter falls back
    /// to the classifier.
    pub fallback_active_low: f64,

    /// Above this active-frame fraction, the activity segmenter falls back
    /// to the classifier.
    pub fallback_active_high: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extract_fps: 10,
            batch_size: 8,
            smoothing_window: 5,
            motion_threshold: 1.5,
            hysteresis_on: 3,
            hysteresis_off: 5,
            d_top: 0.80,
            d_bot: 0.20,
            t_min_rep: 0.4,
            soft_deg: 8.0,
            hard_deg: 20.0,
            dtw_band_frac: 0.15,
            min_visibility: 0.3,
            max_impute_gap: 3,
            motion_window: 3,
            fallback_active_low: 0.30,
            fallback_active_high: 0.95,
        }
    }
}

impl Config {
    /// Validate every knob against its documented range. Called once at
    /// `analyze()` entry; downstream stages assume a validated `Config`.
    pub fn validate(&self) -> ModelResult<()> {
        if !(1..=30).contains(&self.extract_fps) {
            return Err(ModelError::config(format!(
                "extract_fps must be in 1..=30, got {}",
                self.extract_fps
            )));
        }
        if self.batch_size < 1 {
            return Err(ModelError::config("batch_size must be >= 1"));
        }
        if self.smoothing_window < 1 {
            return Err(ModelError::config("smoothing_window must be >= 1"));
        }
        if self.motion_threshold <= 0.0 {
            return Err(ModelError::config("motion_threshold must be > 0"));
        }
        if self.hysteresis_on == 0 || self.hysteresis_off == 0 {
            return Err(ModelError::config("hysteresis_on/off must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.d_top) || !(0.0..=1.0).contains(&self.d_bot) {
            return Err(ModelError::config("d_top/d_bot must be in [0,1]"));
        }
        if self.d_bot >= self.d_top {
            return Err(ModelError::config("d_bot must be < d_top"));
        }
        if self.t_min_rep <= 0.0 {
            return Err(ModelError::config("t_min_rep must be > 0"));
        }
        if self.soft_deg <= 0.0 || self.hard_deg <= 0.0 {
            return Err(ModelError::config("soft_deg/hard_deg must be > 0"));
        }
        if self.soft_deg > self.hard_deg {
            return Err(ModelError::config("soft_deg must be <= hard_deg"));
        }
        if !(0.0..=1.0).contains(&self.dtw_band_frac) {
            return Err(ModelError::config("dtw_band_frac must be in [0,1]"));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(ModelError::config("min_visibility must be in [0,1]"));
        }
        if !(0.0..=1.0).contains(&self.fallback_active_low)
            || !(0.0..=1.0).contains(&self.fallback_active_high)
            || self.fallback_active_low >= self.fallback_active_high
        {
            return Err(ModelError::config(
                "fallback_active_low must be < fallback_active_high, both in [0,1]",
            ));
        }
        Ok(())
    }

    /// Defaults tuned for push-up analysis. Identical to `Config::default()`
    /// today; kept as a named preset so push-up-specific tuning has a home
    /// (mirrors `IntelligentCropConfig::tiktok()`).
    pub fn pushup_defaults() -> Self {
        Self::default()
    }

    /// Defaults tuned for pull-up analysis: pull-ups complete reps faster
    /// than push-ups, so the minimum rep duration is shortened slightly.
    pub fn pullup_defaults() -> Self {
        Self {
            t_min_rep: 0.35,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::pushup_defaults().validate().is_ok());
        assert!(Config::pullup_defaults().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fps() {
        let mut cfg = Config::default();
        cfg.extract_fps = 0;
        assert!(cfg.validate().is_err());
        cfg.extract_fps = 31;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let mut cfg = Config::default();
        cfg.d_top = 0.1;
        cfg.d_bot = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_soft_greater_than_hard() {
        let mut cfg = Config::default();
        cfg.soft_deg = 25.0;
        cfg.hard_deg = 20.0;
        assert!(cfg.validate().is_err());
    }
}
