use anyhow::Result;
use image::RgbImage;

/// Body joints the technique rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const COUNT: usize = 13;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Index of this joint in the 33-point BlazePose topology
    pub fn blazepose_index(self) -> usize {
        match self {
            Joint::Nose => 0,
            Joint::LeftShoulder => 11,
            Joint::RightShoulder => 12,
            Joint::LeftElbow => 13,
            Joint::RightElbow => 14,
            Joint::LeftWrist => 15,
            Joint::RightWrist => 16,
            Joint::LeftHip => 23,
            Joint::RightHip => 24,
            Joint::LeftKnee => 25,
            Joint::RightKnee => 26,
            Joint::LeftAnkle => 27,
            Joint::RightAnkle => 28,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A single landmark in normalized image coordinates
///
/// `x` and `y` are in roughly 0.0-1.0 with `y` growing downward,
/// `z` is depth relative to the hips (smaller is closer to the camera).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks for every [`Joint`] of one detected body
///
/// Always complete: a set cannot be built with a joint missing.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Landmark; Joint::COUNT],
}

impl LandmarkSet {
    pub fn from_fn<F: FnMut(Joint) -> Landmark>(mut f: F) -> Self {
        let mut points = [Landmark::default(); Joint::COUNT];
        for joint in Joint::ALL {
            points[joint.slot()] = f(joint);
        }
        Self { points }
    }

    pub fn get(&self, joint: Joint) -> Landmark {
        self.points[joint.slot()]
    }

    /// Copy of this set with one joint replaced
    #[cfg(test)]
    pub fn with(mut self, joint: Joint, landmark: Landmark) -> Self {
        self.points[joint.slot()] = landmark;
        self
    }
}

/// Trait for pose landmark models
/// Allows swapping between different backends (BlazePose, MoveNet, test fixtures)
pub trait LandmarkSource {
    /// Detect the body in a frame
    ///
    /// # Returns
    /// * `Ok(None)` when no body is found in the frame
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>>;

    /// Get the model's input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_visits_every_joint() {
        let set = LandmarkSet::from_fn(|joint| Landmark::new(joint.blazepose_index() as f64, 0.0, 0.0));
        for joint in Joint::ALL {
            assert_eq!(set.get(joint).x, joint.blazepose_index() as f64);
        }
    }

    #[test]
    fn test_with_replaces_single_joint() {
        let set = LandmarkSet::from_fn(|_| Landmark::new(0.5, 0.5, 0.0))
            .with(Joint::Nose, Landmark::new(0.1, 0.2, 0.3));
        assert_eq!(set.get(Joint::Nose), Landmark::new(0.1, 0.2, 0.3));
        assert_eq!(set.get(Joint::LeftAnkle), Landmark::new(0.5, 0.5, 0.0));
    }
}
