use super::feedback::prioritize;
use super::stroke::{classify, Stroke};
use super::technique::{analyze, Feedback};
use crate::capture::FrameSource;
use crate::config::{Config, Thresholds};
use crate::pose::{LandmarkSet, LandmarkSource};
use anyhow::{Context, Result};

/// Everything learned from one video
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Most frequent per-frame stroke
    pub stroke: Stroke,
    /// Prioritized, deduplicated improvements
    pub improvements: Vec<String>,
    /// Deduplicated positive observations
    pub positives: Vec<String>,
    /// Detected training equipment. Equipment detection is not implemented,
    /// so this is always empty.
    pub equipment: Vec<String>,
}

/// Per-stroke frame counts in first-seen order
#[derive(Debug, Default)]
pub struct StrokeTally {
    counts: Vec<(Stroke, usize)>,
}

impl StrokeTally {
    pub fn record(&mut self, stroke: Stroke) {
        match self.counts.iter_mut().find(|(seen, _)| *seen == stroke) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((stroke, 1)),
        }
    }

    /// Most counted stroke; on a tie the one seen first wins
    pub fn mode(&self) -> Stroke {
        let mut best: Option<(Stroke, usize)> = None;
        for &(stroke, count) in &self.counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((stroke, count));
            }
        }
        best.map_or(Stroke::Unknown, |(stroke, _)| stroke)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

/// Running state while the frames of one video go by
pub struct VideoAccumulator<'a> {
    thresholds: &'a Thresholds,
    tally: StrokeTally,
    feedback: Feedback,
}

impl<'a> VideoAccumulator<'a> {
    pub fn new(thresholds: &'a Thresholds) -> Self {
        Self {
            thresholds,
            tally: StrokeTally::default(),
            feedback: Feedback::default(),
        }
    }

    /// Classify and judge one frame's pose
    pub fn observe(&mut self, landmarks: &LandmarkSet) {
        let stroke = classify(landmarks);
        self.tally.record(stroke);
        self.feedback.extend(analyze(landmarks, stroke, self.thresholds));
    }

    pub fn frames_with_pose(&self) -> usize {
        self.tally.total()
    }

    pub fn finish(self) -> AnalysisResult {
        let stroke = self.tally.mode();
        let feedback = prioritize(self.feedback);

        AnalysisResult {
            stroke,
            improvements: feedback.improvements,
            positives: feedback.positives,
            equipment: Vec::new(),
        }
    }
}

/// Run the landmark model over a video and judge the swimmer's technique
///
/// Reads up to `config.max_frames` frames. Frames where no body is found
/// still count toward that limit but are otherwise ignored.
pub fn analyze_video<F, L>(frames: &mut F, model: &mut L, config: &Config) -> Result<AnalysisResult>
where
    F: FrameSource + ?Sized,
    L: LandmarkSource + ?Sized,
{
    let mut accumulator = VideoAccumulator::new(&config.thresholds);
    let mut frame_count = 0usize;

    while frame_count < config.max_frames {
        let Some(frame) = frames.next_frame().context("Failed to read frame")? else {
            break;
        };

        let _span = tracing::debug_span!("frame", index = frame_count).entered();
        if let Some(landmarks) = model.detect(&frame).context("Failed to detect pose")? {
            accumulator.observe(&landmarks);
        }

        frame_count += 1;

        if frame_count % 30 == 0 {
            tracing::debug!(
                "Frame {}: {} frames with a detected swimmer",
                frame_count,
                accumulator.frames_with_pose()
            );
        }
    }

    tracing::info!(
        "Read {} frames, swimmer detected in {}",
        frame_count,
        accumulator.frames_with_pose()
    );

    Ok(accumulator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::feedback::{NO_IMPROVEMENTS, NO_POSITIVES};
    use crate::pose::{Joint, Landmark};
    use image::RgbImage;

    /// Yields `count` blank frames
    struct BlankFrames {
        remaining: usize,
        read: usize,
    }

    impl BlankFrames {
        fn new(count: usize) -> Self {
            Self {
                remaining: count,
                read: 0,
            }
        }
    }

    impl FrameSource for BlankFrames {
        fn next_frame(&mut self) -> Result<Option<RgbImage>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            self.read += 1;
            Ok(Some(RgbImage::new(4, 4)))
        }

        fn resolution(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    /// Plays back a fixed sequence of detections, then finds nobody
    struct Scripted {
        poses: Vec<Option<LandmarkSet>>,
        next: usize,
    }

    impl LandmarkSource for Scripted {
        fn detect(&mut self, _frame: &RgbImage) -> Result<Option<LandmarkSet>> {
            let pose = self.poses.get(self.next).cloned().flatten();
            self.next += 1;
            Ok(pose)
        }

        fn input_size(&self) -> (u32, u32) {
            (4, 4)
        }
    }

    fn pose(stroke: Stroke) -> LandmarkSet {
        // Shoulders at 0.4; elbows above (0.2) or below (0.6) them
        let (nose_y, left_elbow_y, right_elbow_y) = match stroke {
            Stroke::Backstroke => (0.5, 0.6, 0.6),
            Stroke::Butterfly => (0.3, 0.2, 0.2),
            Stroke::Freestyle => (0.3, 0.2, 0.6),
            _ => (0.3, 0.6, 0.6),
        };
        LandmarkSet::from_fn(|_| Landmark::new(0.5, 0.6, 0.0))
            .with(Joint::Nose, Landmark::new(0.5, nose_y, 0.0))
            .with(Joint::LeftShoulder, Landmark::new(0.4, 0.4, 0.0))
            .with(Joint::RightShoulder, Landmark::new(0.6, 0.4, 0.0))
            .with(Joint::LeftElbow, Landmark::new(0.35, left_elbow_y, 0.0))
            .with(Joint::RightElbow, Landmark::new(0.65, right_elbow_y, 0.0))
    }

    #[test]
    fn test_tally_mode_prefers_first_seen_on_tie() {
        let mut tally = StrokeTally::default();
        for stroke in [Stroke::Butterfly, Stroke::Freestyle, Stroke::Freestyle, Stroke::Butterfly] {
            tally.record(stroke);
        }
        assert_eq!(tally.mode(), Stroke::Butterfly);
        assert_eq!(tally.total(), 4);

        tally.record(Stroke::Freestyle);
        assert_eq!(tally.mode(), Stroke::Freestyle);
    }

    #[test]
    fn test_empty_tally_is_unknown() {
        assert_eq!(StrokeTally::default().mode(), Stroke::Unknown);
    }

    #[test]
    fn test_video_without_swimmer() {
        let mut frames = BlankFrames::new(12);
        let mut model = Scripted {
            poses: Vec::new(),
            next: 0,
        };

        let result = analyze_video(&mut frames, &mut model, &Config::default()).unwrap();

        assert_eq!(result.stroke, Stroke::Unknown);
        assert_eq!(result.improvements, vec![NO_IMPROVEMENTS.to_string()]);
        assert_eq!(result.positives, vec![NO_POSITIVES.to_string()]);
        assert!(result.equipment.is_empty());
        assert_eq!(frames.read, 12);
    }

    #[test]
    fn test_modal_stroke_skips_empty_frames() {
        let mut frames = BlankFrames::new(6);
        let mut model = Scripted {
            poses: vec![
                None,
                Some(pose(Stroke::Freestyle)),
                Some(pose(Stroke::Butterfly)),
                None,
                Some(pose(Stroke::Butterfly)),
                None,
            ],
            next: 0,
        };

        let result = analyze_video(&mut frames, &mut model, &Config::default()).unwrap();

        assert_eq!(result.stroke, Stroke::Butterfly);
        // Freestyle and butterfly remarks are both collected, deduplicated
        assert!(result.improvements.iter().chain(&result.positives).any(|i| i.contains("dolphin")));
        let unique: std::collections::HashSet<_> =
            result.positives.iter().map(|item| item.to_lowercase()).collect();
        assert_eq!(unique.len(), result.positives.len());
    }

    #[test]
    fn test_frame_limit() {
        let mut frames = BlankFrames::new(50);
        let mut model = Scripted {
            poses: vec![Some(pose(Stroke::Breaststroke)); 50],
            next: 0,
        };
        let config = Config {
            max_frames: 20,
            ..Config::default()
        };

        let result = analyze_video(&mut frames, &mut model, &config).unwrap();

        assert_eq!(frames.read, 20);
        assert_eq!(model.next, 20);
        assert_eq!(result.stroke, Stroke::Breaststroke);
    }

    #[test]
    fn test_frame_error_aborts_video() {
        struct Broken;

        impl FrameSource for Broken {
            fn next_frame(&mut self) -> Result<Option<RgbImage>> {
                anyhow::bail!("corrupt stream")
            }

            fn resolution(&self) -> (u32, u32) {
                (0, 0)
            }
        }

        let mut model = Scripted {
            poses: Vec::new(),
            next: 0,
        };
        let err = analyze_video(&mut Broken, &mut model, &Config::default()).unwrap_err();
        assert!(format!("{err:#}").contains("corrupt stream"));
    }
}
