mod feedback;
mod geometry;
mod stroke;
mod technique;
mod video;

pub use stroke::Stroke;
pub use video::{analyze_video, AnalysisResult};
