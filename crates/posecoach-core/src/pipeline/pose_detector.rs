//! Stage 2: Pose Detector.
//!
//! Batched ONNX Runtime inference, grounded on the `ort::Session` wrapper
//! used for face-mesh landmark refinement: a model loaded once behind a
//! `Mutex`, fed fixed-size batches as `ndarray` tensors.

use std::path::Path;
use std::sync::Mutex;

use image::imageops::FilterType;
use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use rayon::prelude::*;

use posecoach_models::{Config, Frame, Joint, Keypoint, KeypointSet, ALL_JOINTS};

use crate::cancel::CancelToken;
use crate::error::{CoreError, CoreResult};

/// Input tensor side length the model expects (square crop).
const INPUT_SIZE: u32 = 256;

/// ONNX Runtime-backed 17-keypoint pose detector.
///
/// Expects a model with input `[batch, 3, 256, 256]` (RGB, `[0,1]`) and
/// output `[batch, 17, 3]` giving `(x, y, vis)` per joint, already
/// image-normalized to `[0,1]`.
pub struct PoseDetector {
    session: Mutex<Session>,
}

impl PoseDetector {
    pub fn load(model_path: &Path) -> CoreResult<Self> {
        if !model_path.exists() {
            return Err(CoreError::detection(format!(
                "pose model not found at {}",
                model_path.display()
            )));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| CoreError::detection(format!("failed to read model file: {e}")))?;

        let session = Session::builder()
            .map_err(|e| CoreError::detection(format!("ort session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| CoreError::detection(format!("ort optimization level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| CoreError::detection(format!("ort model load: {e}")))?;

        Ok(Self { session: Mutex::new(session) })
    }

    /// Run inference over every frame in `frames`, in batches of
    /// `config.batch_size`, returning one `KeypointSet` per frame in input
    /// order.
    pub fn detect_all(
        &self,
        frames: &[Frame],
        config: &Config,
        cancel: &CancelToken,
    ) -> CoreResult<Vec<KeypointSet>> {
        let mut results = Vec::with_capacity(frames.len());
        for batch in frames.chunks(config.batch_size.max(1)) {
            cancel.check()?;
            let tensors = preprocess_batch(batch)?;
            let batch_results = self.run_batch(&tensors)?;
            results.extend(batch_results);
        }
        Ok(results)
    }

    fn run_batch(&self, tensor: &Array4<f32>) -> CoreResult<Vec<KeypointSet>> {
        let batch_size = tensor.shape()[0];
        let mut session = self
            .session
            .lock()
            .map_err(|_| CoreError::detection("ort session poisoned"))?;

        let input = ort::value::Tensor::from_array(tensor.clone())
            .map_err(|e| CoreError::detection(format!("ort tensor build: {e}")))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| CoreError::detection(format!("ort run failed: {e}")))?;

        let output = outputs
            .get("output")
            .ok_or_else(|| CoreError::detection("ort returned no outputs"))?;

        let (shape, data) = output
            .try_extract_raw_tensor::<f32>()
            .map_err(|e| CoreError::detection(format!("ort output extraction: {e}")))?;

        if shape.len() != 3 || shape[1] as usize != ALL_JOINTS.len() || shape[2] != 3 {
            return Err(CoreError::detection(format!(
                "unexpected pose model output shape {shape:?}"
            )));
        }

        let mut sets = Vec::with_capacity(batch_size);
        for b in 0..batch_size {
            let mut set = KeypointSet::all_missing();
            for (j, &joint) in ALL_JOINTS.iter().enumerate() {
                let base = (b * ALL_JOINTS.len() + j) * 3;
                let (x, y, vis) = (data[base], data[base + 1], data[base + 2]);
                set.set(joint, Keypoint::new(x as f64, y as f64, vis as f64));
            }
            sets.push(set);
        }
        Ok(sets)
    }
}

/// Decode, resize, and normalize a batch of thumbnails into a `[B,3,H,W]`
/// tensor. Frames whose image fails to decode get an all-zero slot, which
/// the model should score as no detection.
fn preprocess_batch(frames: &[Frame]) -> CoreResult<Array4<f32>> {
    let decoded: Vec<[f32; (INPUT_SIZE * INPUT_SIZE * 3) as usize]> = frames
        .par_iter()
        .map(|frame| decode_and_normalize(&frame.thumbnail_path))
        .collect();

    let mut tensor = Array4::<f32>::zeros((frames.len(), 3, INPUT_SIZE as usize, INPUT_SIZE as usize));
    for (b, chw) in decoded.iter().enumerate() {
        for c in 0..3 {
            for y in 0..INPUT_SIZE as usize {
                for x in 0..INPUT_SIZE as usize {
                    let idx = c * (INPUT_SIZE * INPUT_SIZE) as usize + y * INPUT_SIZE as usize + x;
                    tensor[[b, c, y, x]] = chw[idx];
                }
            }
        }
    }
    Ok(tensor)
}

fn decode_and_normalize(path: &str) -> [f32; (INPUT_SIZE * INPUT_SIZE * 3) as usize] {
    let mut chw = [0.0f32; (INPUT_SIZE * INPUT_SIZE * 3) as usize];
    let Ok(img) = image::open(path) else {
        return chw;
    };
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle).to_rgb8();

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let idx = c * (INPUT_SIZE * INPUT_SIZE) as usize + y * INPUT_SIZE as usize + x;
            chw[idx] = pixel[c] as f32 / 255.0;
        }
    }
    chw
}

/// Whether a keypoint set reflects "no human detected" rather than a
/// present-but-occluded joint.
pub fn is_no_detection(set: &KeypointSet, min_visibility: f64) -> bool {
    ALL_JOINTS.iter().all(|&j| set.get(j).vis < min_visibility)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_missing_set_counts_as_no_detection() {
        assert!(is_no_detection(&KeypointSet::all_missing(), 0.3));
    }

    #[test]
    fn one_confident_joint_is_a_detection() {
        let mut set = KeypointSet::all_missing();
        set.set(Joint::LeftElbow, Keypoint::new(0.5, 0.5, 0.9));
        assert!(!is_no_detection(&set, 0.3));
    }
}
