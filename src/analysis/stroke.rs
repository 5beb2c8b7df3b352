use crate::pose::{Joint, LandmarkSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    Unknown,
}

impl Stroke {
    pub fn name(self) -> &'static str {
        match self {
            Stroke::Freestyle => "Freestyle",
            Stroke::Backstroke => "Backstroke",
            Stroke::Breaststroke => "Breaststroke",
            Stroke::Butterfly => "Butterfly",
            Stroke::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Guess the stroke from a single pose
///
/// Image y grows downward, so "above" means a smaller y.
/// 1. Nose lower than both shoulders: face up, backstroke.
/// 2. Both elbows above their shoulders: butterfly.
/// 3. One elbow above its shoulder: freestyle.
/// 4. Otherwise breaststroke.
pub fn classify(landmarks: &LandmarkSet) -> Stroke {
    let nose = landmarks.get(Joint::Nose);
    let left_shoulder = landmarks.get(Joint::LeftShoulder);
    let right_shoulder = landmarks.get(Joint::RightShoulder);
    let left_elbow = landmarks.get(Joint::LeftElbow);
    let right_elbow = landmarks.get(Joint::RightElbow);

    let left_up = left_elbow.y < left_shoulder.y;
    let right_up = right_elbow.y < right_shoulder.y;

    if nose.y > left_shoulder.y && nose.y > right_shoulder.y {
        Stroke::Backstroke
    } else if left_up && right_up {
        Stroke::Butterfly
    } else if left_up || right_up {
        Stroke::Freestyle
    } else {
        Stroke::Breaststroke
    }
}
