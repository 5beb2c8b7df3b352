//! Whole-clip activity recognition with a Kinetics-trained video network

mod clip;
mod labels;
mod r3d;

pub use clip::read_clip;
pub use labels::load_labels;
pub use r3d::R3d18;

use anyhow::Result;
use labels::top_k;
use ndarray::Array5;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("video produced no frames")]
    EmptyClip,

    #[error("class index {index} has no label ({labels} labels loaded)")]
    UnknownClass { index: usize, labels: usize },
}

/// Trait for clip-level action classifiers
pub trait ActionModel {
    /// Raw class scores for a `[1, 3, T, H, W]` clip
    fn logits(&mut self, clip: &Array5<f32>) -> Result<Vec<f32>>;

    /// Frame size the model expects (width, height)
    fn clip_size(&self) -> (u32, u32);
}

/// One ranked guess at what the video shows
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f32,
}

/// Best `k` labelled classes for a clip, highest score first
pub fn recognize<M: ActionModel + ?Sized>(
    model: &mut M,
    clip: &Array5<f32>,
    labels: &[String],
    k: usize,
) -> Result<Vec<Prediction>> {
    let logits = model.logits(clip)?;

    let predictions = top_k(&logits, k)
        .into_iter()
        .map(|index| {
            let label = labels.get(index).ok_or(ActionError::UnknownClass {
                index,
                labels: labels.len(),
            })?;
            Ok(Prediction {
                label: label.clone(),
                score: logits[index],
            })
        })
        .collect::<Result<Vec<_>, ActionError>>()?;

    for prediction in &predictions {
        tracing::debug!("{}: {:.3}", prediction.label, prediction.score);
    }

    Ok(predictions)
}

/// Create the default action model (R3D-18)
pub fn create_default_model(model_path: &str) -> Result<Box<dyn ActionModel>> {
    let model = R3d18::new(model_path)?;
    Ok(Box::new(model))
}
