use super::ActionModel;
use anyhow::{Context, Result};
use ndarray::Array5;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;

/// Frame edge the Kinetics R3D-18 network was trained on
const CLIP_SIZE: u32 = 112;

/// R3D-18 video classifier (Kinetics-400)
///
/// Expects the network exported to ONNX with a single `[1, 3, T, 112, 112]`
/// float input and one `[1, classes]` logit output. The time axis is left
/// dynamic, so whole videos go through in one run.
pub struct R3d18 {
    session: Session,
}

impl R3d18 {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading R3D-18 model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("R3D-18 model loaded successfully");

        Ok(Self { session })
    }
}

impl ActionModel for R3d18 {
    fn logits(&mut self, clip: &Array5<f32>) -> Result<Vec<f32>> {
        let _span = tracing::debug_span!("r3d18_inference", frames = clip.shape()[2]).entered();

        let shape: [usize; 5] = [1, 3, clip.shape()[2], clip.shape()[3], clip.shape()[4]];
        let input_tensor = Tensor::from_array((shape, clip.iter().copied().collect::<Vec<f32>>()))?;

        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .context("Failed to run inference")?;

        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;
        Ok(logits.to_vec())
    }

    fn clip_size(&self) -> (u32, u32) {
        (CLIP_SIZE, CLIP_SIZE)
    }
}
