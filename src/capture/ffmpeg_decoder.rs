use super::FrameSource;
use anyhow::{Context, Result};
use image::RgbImage;
use std::io::{ErrorKind, Read};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("ffprobe failed: {0}")]
    Probe(String),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("video stream reports invalid size {0}x{1}")]
    InvalidSize(u32, u32),

    #[error("ffmpeg stdout was not captured")]
    NoStdout,

    #[error("stream ended inside a frame ({read} of {expected} bytes)")]
    TruncatedFrame { read: usize, expected: usize },
}

/// Optional resampling applied by ffmpeg while decoding
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecodeOptions {
    /// Output frame rate; frames are dropped or duplicated to match
    pub fps: Option<u32>,
    /// Output frame size, scaled after rotation
    pub size: Option<(u32, u32)>,
}

/// Decodes a video file to RGB frames by piping `ffmpeg` raw output
///
/// The stream size is probed with `ffprobe` first; `ffmpeg` then writes
/// packed RGB24 frames of exactly that size to its stdout. ffmpeg applies
/// the stream's display rotation, so a phone clip shot in portrait comes
/// out upright and the probed size is swapped to match.
pub struct FfmpegDecoder {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl FfmpegDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, DecodeOptions::default())
    }

    /// Decode with a fixed output frame rate and/or frame size
    pub fn open_with<P: AsRef<Path>>(path: P, options: DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let (width, height) = match options.size {
            Some(size) => {
                probe_dimensions(path)?;
                size
            }
            None => probe_dimensions(path)?,
        };

        tracing::debug!("Decoding {} at {}x{} ({:?})", path.display(), width, height, options);

        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(path, &options))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to execute ffmpeg")?;

        let stdout = child.stdout.take().ok_or(CaptureError::NoStdout)?;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            buffer: vec![0; width as usize * height as usize * 3],
        })
    }
}

/// Command line for decoding `path` to raw RGB24 on stdout
fn ffmpeg_args(path: &Path, options: &DecodeOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-nostdin", "-i"].iter().map(OsString::from).collect();
    args.push(path.as_os_str().to_owned());

    let mut filters = Vec::new();
    if let Some(fps) = options.fps {
        filters.push(format!("fps={fps}"));
    }
    if let Some((width, height)) = options.size {
        filters.push(format!("scale={width}:{height}"));
    }
    if !filters.is_empty() {
        args.push("-vf".into());
        args.push(filters.join(",").into());
    }

    args.extend(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"].iter().map(OsString::from));
    args
}

impl FrameSource for FfmpegDecoder {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let filled = read_full(&mut self.stdout, &mut self.buffer).context("Failed to read from ffmpeg")?;

        if filled == 0 {
            return Ok(None);
        }
        if filled < self.buffer.len() {
            return Err(CaptureError::TruncatedFrame {
                read: filled,
                expected: self.buffer.len(),
            }
            .into());
        }

        let frame = RgbImage::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or(CaptureError::InvalidSize(self.width, self.height))?;
        Ok(Some(frame))
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        // ffmpeg may still be writing when we stop early at the frame limit
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Frame size of the first video stream, via ffprobe
fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(path)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        return Err(CaptureError::Probe(String::from_utf8_lossy(&output.stderr).trim().to_string()).into());
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;
    parse_dimensions(&json)
}

/// Displayed frame size of the first video stream
///
/// A stream rotated by 90 or 270 degrees is shown with width and height
/// swapped. Newer ffprobe reports this as a display matrix rotation in
/// `side_data_list`, older builds as a `rotate` tag.
fn parse_dimensions(json: &serde_json::Value) -> Result<(u32, u32)> {
    let stream = json["streams"]
        .as_array()
        .and_then(|s| s.first())
        .ok_or(CaptureError::NoVideoStream)?;

    let width = stream["width"].as_u64().unwrap_or(0) as u32;
    let height = stream["height"].as_u64().unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(CaptureError::InvalidSize(width, height).into());
    }

    if stream_rotation(stream).rem_euclid(180) == 90 {
        Ok((height, width))
    } else {
        Ok((width, height))
    }
}

/// Display rotation in whole degrees, 0 when none is recorded
fn stream_rotation(stream: &serde_json::Value) -> i64 {
    let from_side_data = stream["side_data_list"]
        .as_array()
        .into_iter()
        .flatten()
        .find_map(|side_data| side_data["rotation"].as_f64());

    let from_tag = || {
        stream["tags"]["rotate"]
            .as_str()
            .and_then(|rotate| rotate.trim().parse::<f64>().ok())
    };

    from_side_data.or_else(from_tag).map_or(0, |degrees| degrees.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_dimensions() {
        let json = serde_json::json!({
            "streams": [{ "codec_name": "h264", "width": 1920, "height": 1080 }]
        });
        assert_eq!(parse_dimensions(&json).unwrap(), (1920, 1080));
    }

    #[test]
    fn test_parse_dimensions_swaps_rotated_stream() {
        // Portrait phone clip: coded landscape, displayed rotated
        let json = serde_json::json!({
            "streams": [{
                "width": 1920,
                "height": 1080,
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": -90 }]
            }]
        });
        assert_eq!(parse_dimensions(&json).unwrap(), (1080, 1920));

        let tagged = serde_json::json!({
            "streams": [{ "width": 1920, "height": 1080, "tags": { "rotate": "270" } }]
        });
        assert_eq!(parse_dimensions(&tagged).unwrap(), (1080, 1920));

        let upside_down = serde_json::json!({
            "streams": [{
                "width": 1920,
                "height": 1080,
                "side_data_list": [{ "side_data_type": "Display Matrix", "rotation": 180 }]
            }]
        });
        assert_eq!(parse_dimensions(&upside_down).unwrap(), (1920, 1080));
    }

    #[test]
    fn test_ffmpeg_args() {
        let plain = ffmpeg_args(Path::new("lap.mp4"), &DecodeOptions::default());
        assert_eq!(
            plain,
            ["-v", "error", "-nostdin", "-i", "lap.mp4", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]
                .map(OsString::from)
        );

        let resampled = ffmpeg_args(
            Path::new("lap.mp4"),
            &DecodeOptions {
                fps: Some(16),
                size: Some((112, 112)),
            },
        );
        let filter = resampled.iter().position(|arg| arg == "-vf").unwrap();
        assert_eq!(resampled[filter + 1], "fps=16,scale=112:112");
        // Rotation stays on so frames match the probed size
        assert!(!resampled.iter().any(|arg| arg == "-noautorotate"));
    }

    #[test]
    fn test_parse_dimensions_without_stream() {
        let json = serde_json::json!({ "streams": [] });
        let err = parse_dimensions(&json).unwrap_err();
        assert!(matches!(err.downcast_ref::<CaptureError>(), Some(CaptureError::NoVideoStream)));
    }

    #[test]
    fn test_read_full_reports_short_tail() {
        let mut reader = Cursor::new(vec![7u8; 10]);
        let mut buf = [0u8; 6];

        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 6);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }
}
