mod ffmpeg_decoder;

pub use ffmpeg_decoder::{DecodeOptions, FfmpegDecoder};

use anyhow::Result;
use image::RgbImage;

/// Trait for decoded video frame sources
pub trait FrameSource {
    /// Decode the next frame
    ///
    /// Returns `Ok(None)` once the video is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Get the resolution of decoded frames
    fn resolution(&self) -> (u32, u32);
}
