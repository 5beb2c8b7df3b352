use super::ActionError;
use crate::capture::FrameSource;
use anyhow::{Context, Result};
use image::{imageops, RgbImage};
use ndarray::Array5;

/// Drain a frame source into one clip tensor
///
/// Stops after `max_frames` when set, otherwise reads the whole video.
pub fn read_clip<F: FrameSource + ?Sized>(frames: &mut F, size: u32, max_frames: Option<usize>) -> Result<Array5<f32>> {
    let mut clip = Vec::new();

    while max_frames.map_or(true, |max| clip.len() < max) {
        let Some(frame) = frames.next_frame().context("Failed to read frame")? else {
            break;
        };
        clip.push(frame);
    }

    tracing::info!("Read {} frames for action recognition", clip.len());
    Ok(clip_tensor(&clip, size)?)
}

/// Stack frames into a `[1, 3, T, size, size]` tensor scaled to [0, 1]
///
/// Frames not already `size` x `size` are stretched to it.
pub fn clip_tensor(frames: &[RgbImage], size: u32) -> Result<Array5<f32>, ActionError> {
    if frames.is_empty() {
        return Err(ActionError::EmptyClip);
    }

    let side = size as usize;
    let mut tensor = Array5::<f32>::zeros((1, 3, frames.len(), side, side));

    for (t, frame) in frames.iter().enumerate() {
        let resized;
        let frame = if frame.dimensions() == (size, size) {
            frame
        } else {
            resized = imageops::resize(frame, size, size, imageops::FilterType::Triangle);
            &resized
        };

        for (x, y, pixel) in frame.enumerate_pixels() {
            for channel in 0..3 {
                tensor[[0, channel, t, y as usize, x as usize]] = pixel[channel] as f32 / 255.0;
            }
        }
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Solid {
        remaining: usize,
    }

    impl FrameSource for Solid {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 51]))))
        }

        fn resolution(&self) -> (u32, u32) {
            (8, 8)
        }
    }

    #[test]
    fn test_clip_is_channels_first() {
        let clip = read_clip(&mut Solid { remaining: 3 }, 4, None).unwrap();

        assert_eq!(clip.shape(), &[1, 3, 3, 4, 4]);
        assert!((clip[[0, 0, 2, 1, 3]] - 1.0).abs() < 1e-6);
        assert!(clip[[0, 1, 2, 1, 3]].abs() < 1e-6);
        assert!((clip[[0, 2, 0, 0, 0]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_clip_frame_cap() {
        let clip = read_clip(&mut Solid { remaining: 10 }, 4, Some(6)).unwrap();
        assert_eq!(clip.shape()[2], 6);
    }

    #[test]
    fn test_empty_video_is_an_error() {
        let err = read_clip(&mut Solid { remaining: 0 }, 4, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<ActionError>(), Some(ActionError::EmptyClip)));
    }
}
