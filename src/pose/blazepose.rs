use super::preprocess::Preprocessor;
use super::types::{Joint, Landmark, LandmarkSet, LandmarkSource};
use crate::config::ModelConfig;
use anyhow::{Context, Result};
use image::RgbImage;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use thiserror::Error;

/// Values per landmark in the model output: x, y, z, visibility, presence
const LANDMARK_STRIDE: usize = 5;

/// Landmarks in the BlazePose body topology (the model emits 6 extra
/// auxiliary points after these)
const BODY_LANDMARKS: usize = 33;

#[derive(Debug, Error)]
pub enum PoseError {
    #[error("landmark tensor too short: {0} values")]
    ShortLandmarkTensor(usize),

    #[error("pose presence tensor is empty")]
    MissingPresence,
}

/// BlazePose full-body landmark model
///
/// Expects the single-person landmark network exported to ONNX with an
/// NHWC input of `input_size` x `input_size` and two outputs: the flat
/// landmark tensor (`[1, 195]`) and the pose presence logit (`[1, 1]`).
pub struct BlazePose {
    session: Session,
    preprocessor: Preprocessor,
    input_size: u32,
    presence_threshold: f32,
}

impl BlazePose {
    /// Create a new BlazePose model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, config: &ModelConfig) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading BlazePose model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("BlazePose model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(config.input_size, config.input_size),
            input_size: config.input_size,
            presence_threshold: config.presence_threshold,
        })
    }
}

impl LandmarkSource for BlazePose {
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>> {
        let _span = tracing::debug_span!("blazepose_detect").entered();

        let input = self.preprocessor.preprocess(frame)?;
        let size = self.input_size as usize;
        let input_tensor = Tensor::from_array(([1usize, size, size, 3], input.iter().copied().collect::<Vec<f32>>()))?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let (_, raw_landmarks) = outputs[0].try_extract_tensor::<f32>()?;
        let (_, raw_presence) = outputs[1].try_extract_tensor::<f32>()?;
        let presence_logit = *raw_presence.first().ok_or(PoseError::MissingPresence)?;

        let landmarks = decode_landmarks(
            raw_landmarks,
            presence_logit,
            self.input_size as f32,
            self.presence_threshold,
        )?;

        if landmarks.is_none() {
            tracing::debug!("No body detected (presence logit {:.2})", presence_logit);
        }

        Ok(landmarks)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.input_size, self.input_size)
    }
}

/// Turn raw model output into a landmark set
///
/// Landmark x/y/z come out in input pixel units; they are divided by the
/// input size to get frame-normalized coordinates. The presence value is a
/// logit and goes through a sigmoid before the threshold test.
pub fn decode_landmarks(
    raw: &[f32],
    presence_logit: f32,
    input_size: f32,
    presence_threshold: f32,
) -> Result<Option<LandmarkSet>, PoseError> {
    if raw.len() < BODY_LANDMARKS * LANDMARK_STRIDE {
        return Err(PoseError::ShortLandmarkTensor(raw.len()));
    }

    let presence = 1.0 / (1.0 + (-presence_logit).exp());
    if presence < presence_threshold {
        return Ok(None);
    }

    let set = LandmarkSet::from_fn(|joint: Joint| {
        let offset = joint.blazepose_index() * LANDMARK_STRIDE;
        Landmark::new(
            f64::from(raw[offset] / input_size),
            f64::from(raw[offset + 1] / input_size),
            f64::from(raw[offset + 2] / input_size),
        )
    });

    Ok(Some(set))
}
