mod blazepose;
mod preprocess;
pub mod types;

pub use blazepose::BlazePose;
pub use types::{Joint, Landmark, LandmarkSet, LandmarkSource};

use crate::config::ModelConfig;
use anyhow::Result;

/// Create the default landmark model (BlazePose)
pub fn create_default_model(model_path: &str, config: &ModelConfig) -> Result<Box<dyn LandmarkSource>> {
    let model = BlazePose::new(model_path, config)?;
    Ok(Box::new(model))
}
