//! Stroke-specific technique rules
//!
//! Each rule looks at one aspect of the pose and produces exactly one
//! remark: an improvement when the rule's condition holds, a positive
//! observation otherwise.

use super::geometry::{angle, body_line_angle, distance, mid_y};
use super::stroke::Stroke;
use crate::config::Thresholds;
use crate::pose::{Joint, Landmark, LandmarkSet};

/// Coaching remarks, split by kind, in the order they were produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feedback {
    pub improvements: Vec<String>,
    pub positives: Vec<String>,
}

impl Feedback {
    /// Record the outcome of one rule
    fn judge(&mut self, needs_work: bool, improvement: impl Into<String>, positive: impl Into<String>) {
        if needs_work {
            self.improvements.push(improvement.into());
        } else {
            self.positives.push(positive.into());
        }
    }

    pub fn extend(&mut self, other: Feedback) {
        self.improvements.extend(other.improvements);
        self.positives.extend(other.positives);
    }

    pub fn is_empty(&self) -> bool {
        self.improvements.is_empty() && self.positives.is_empty()
    }
}

/// Named view over the joints of one frame
struct Pose {
    nose: Landmark,
    left_shoulder: Landmark,
    right_shoulder: Landmark,
    left_elbow: Landmark,
    right_elbow: Landmark,
    left_wrist: Landmark,
    right_wrist: Landmark,
    left_hip: Landmark,
    right_hip: Landmark,
    left_knee: Landmark,
    right_knee: Landmark,
    left_ankle: Landmark,
    right_ankle: Landmark,
}

impl Pose {
    fn new(set: &LandmarkSet) -> Self {
        Self {
            nose: set.get(Joint::Nose),
            left_shoulder: set.get(Joint::LeftShoulder),
            right_shoulder: set.get(Joint::RightShoulder),
            left_elbow: set.get(Joint::LeftElbow),
            right_elbow: set.get(Joint::RightElbow),
            left_wrist: set.get(Joint::LeftWrist),
            right_wrist: set.get(Joint::RightWrist),
            left_hip: set.get(Joint::LeftHip),
            right_hip: set.get(Joint::RightHip),
            left_knee: set.get(Joint::LeftKnee),
            right_knee: set.get(Joint::RightKnee),
            left_ankle: set.get(Joint::LeftAnkle),
            right_ankle: set.get(Joint::RightAnkle),
        }
    }

    fn shoulder_mid_y(&self) -> f64 {
        mid_y(self.left_shoulder, self.right_shoulder)
    }

    fn shoulder_width(&self) -> f64 {
        (self.left_shoulder.x - self.right_shoulder.x).abs()
    }

    fn wrist_width(&self) -> f64 {
        (self.left_wrist.x - self.right_wrist.x).abs()
    }

    fn ankle_spread(&self) -> f64 {
        (self.left_ankle.y - self.right_ankle.y).abs()
    }

    fn shoulder_depth_gap(&self) -> f64 {
        (self.left_shoulder.z - self.right_shoulder.z).abs()
    }

    /// Absolute torso inclination in degrees
    fn body_angle(&self) -> f64 {
        body_line_angle(self.left_shoulder, self.right_shoulder, self.left_hip, self.right_hip).abs()
    }

    fn any_elbow_above_shoulder(&self) -> bool {
        self.left_elbow.y < self.left_shoulder.y || self.right_elbow.y < self.right_shoulder.y
    }
}

/// Run the rule battery for `stroke` over one frame's landmarks
pub fn analyze(landmarks: &LandmarkSet, stroke: Stroke, thresholds: &Thresholds) -> Feedback {
    let pose = Pose::new(landmarks);
    let mut feedback = Feedback::default();

    match stroke {
        Stroke::Freestyle => freestyle(&pose, thresholds, &mut feedback),
        Stroke::Breaststroke => breaststroke(&pose, thresholds, &mut feedback),
        Stroke::Backstroke => backstroke(&pose, thresholds, &mut feedback),
        Stroke::Butterfly => butterfly(&pose, thresholds, &mut feedback),
        Stroke::Unknown => {}
    }

    feedback
}

fn freestyle(pose: &Pose, t: &Thresholds, out: &mut Feedback) {
    out.judge(
        pose.nose.y < pose.shoulder_mid_y(),
        "Keep your head down: Look at the bottom of the pool to maintain proper body alignment",
        "Good head position: Your eyes are looking down, helping to keep your hips high",
    );

    let body_angle = pose.body_angle();
    out.judge(
        body_angle > t.freestyle_body_angle,
        format!(
            "Improve body alignment: Your body is at a {:.1} degree angle. Aim for a more horizontal position",
            body_angle
        ),
        "Good body alignment: Your body is maintaining a horizontal position in the water",
    );

    let hip_drop = mid_y(pose.left_hip, pose.right_hip) - pose.shoulder_mid_y();
    out.judge(
        hip_drop > t.hip_drop,
        "Lift your hips: Keep your hips high in the water to reduce drag",
        "Good hip position: Your hips are high, reducing drag and improving efficiency",
    );

    let left_reach = distance(pose.left_wrist, pose.left_shoulder);
    let right_reach = distance(pose.right_wrist, pose.right_shoulder);
    out.judge(
        left_reach < t.arm_extension || right_reach < t.arm_extension,
        "Extend your arms further: Reach forward more on each stroke to maximize your distance per stroke",
        "Good arm extension: You're reaching forward well, maximizing your distance per stroke",
    );

    let left_elbow = angle(pose.left_shoulder, pose.left_elbow, pose.left_wrist);
    let right_elbow = angle(pose.right_shoulder, pose.right_elbow, pose.right_wrist);
    out.judge(
        left_elbow > t.catch_elbow_angle || right_elbow > t.catch_elbow_angle,
        "Improve your catch: Keep your elbow high during the pull phase for better propulsion",
        "Good high elbow catch: Your elbow position during the pull phase is effective",
    );

    out.judge(
        pose.shoulder_depth_gap() < t.shoulder_rotation,
        "Increase body rotation: Rotate your body more with each stroke for better efficiency",
        "Good body rotation: You're rotating well with each stroke, which helps with efficiency",
    );

    out.judge(
        pose.ankle_spread() > t.kick_amplitude,
        "Refine your kick: Keep your kicks narrow and rhythmic to maintain streamlined body position",
        "Good kick technique: Your kicks are compact and efficient",
    );

    out.judge(
        pose.wrist_width() > t.hand_entry_width,
        "Narrow your hand entry: Your hands should enter the water at shoulder width",
        "Good hand entry: Your hands are entering the water at an appropriate width",
    );
}

fn breaststroke(pose: &Pose, t: &Thresholds, out: &mut Feedback) {
    let shoulder_width = pose.shoulder_width();

    // Three-way: too wide, too narrow, or right
    let arm_width = pose.wrist_width();
    if arm_width > shoulder_width * t.shoulder_width_ratio {
        out.improvements
            .push("Narrow your arm pull: Your hands are too wide during the pull phase".to_string());
    } else if arm_width < shoulder_width {
        out.improvements
            .push("Widen your arm pull: Your hands are too close during the pull phase".to_string());
    } else {
        out.positives
            .push("Good arm width: Your hands are at an appropriate width during the pull phase".to_string());
    }

    out.judge(
        (pose.left_elbow.y - pose.right_elbow.y).abs() > t.body_alignment,
        "Improve timing: Coordinate your arm pull and leg kick for better propulsion",
        "Good timing: Your arm pull and leg kick are well-coordinated",
    );

    let knee_width = (pose.left_knee.x - pose.right_knee.x).abs();
    out.judge(
        knee_width > shoulder_width * t.shoulder_width_ratio,
        "Narrow your kick: Keep your knees within shoulder width for a more efficient kick",
        "Good kick width: Your knees are at an appropriate width for an efficient breaststroke kick",
    );

    let pull_width = (pose.left_elbow.x - pose.left_shoulder.x)
        .abs()
        .max((pose.right_elbow.x - pose.right_shoulder.x).abs());
    out.judge(
        pull_width > t.arm_movement,
        "Improve pull width: Keep your arm pull narrow and efficient",
        "Efficient pull: Your arm pull is appropriately narrow",
    );

    let body_angle = pose.body_angle();
    out.judge(
        body_angle > t.body_angle,
        format!(
            "Improve body position: Your body is at a {:.1} degree angle. Aim for a more horizontal position",
            body_angle
        ),
        "Good body position: You're maintaining a horizontal body position",
    );

    out.judge(
        pose.nose.y < pose.shoulder_mid_y(),
        "Lower your head: Keep your head in line with your spine to reduce drag",
        "Good head position: Your head is well-aligned with your spine",
    );

    out.judge(
        pose.wrist_width() > t.body_alignment,
        "Improve glide position: Keep your arms together in streamline during the glide phase",
        "Efficient glide: You're maintaining a good streamline position during the glide phase",
    );

    out.judge(
        pose.any_elbow_above_shoulder(),
        "Improve arm recovery: Keep your elbows lower than your shoulders during recovery",
        "Good arm recovery: Your elbows are positioned correctly during the recovery phase",
    );

    out.judge(
        pose.ankle_spread() > t.body_alignment,
        "Improve kick symmetry: Ensure both legs are moving symmetrically",
        "Good kick symmetry: Your legs are moving symmetrically",
    );

    out.judge(
        (pose.left_hip.y - pose.right_hip.y).abs() > t.body_alignment,
        "Level your hips: Keep your hips aligned to maintain a streamlined position",
        "Good hip position: Your hips are well-aligned, contributing to a streamlined position",
    );
}

fn backstroke(pose: &Pose, t: &Thresholds, out: &mut Feedback) {
    out.judge(
        pose.nose.y < pose.shoulder_mid_y(),
        "Keep your head back: Look straight up to maintain proper body alignment",
        "Good head position: Your head is well-aligned, helping to keep your hips high",
    );

    let body_angle = pose.body_angle();
    out.judge(
        body_angle > t.body_angle,
        format!(
            "Improve body position: Your body is at a {:.1} degree angle. Aim for a more horizontal position",
            body_angle
        ),
        "Good body position: You're maintaining a horizontal body position",
    );

    out.judge(
        pose.wrist_width() > pose.shoulder_width() * t.backstroke_entry_ratio,
        "Narrow your arm entry: Your hands should enter the water at shoulder width",
        "Good arm entry: Your hands are entering the water at an appropriate width",
    );

    out.judge(
        pose.any_elbow_above_shoulder(),
        "Improve your pull: Keep your elbow below your shoulder during the pull phase",
        "Good pull technique: Your elbow position during the pull phase is effective",
    );

    out.judge(
        pose.ankle_spread() > t.kick_amplitude,
        "Reduce kick amplitude: Keep your kicks smaller and more frequent for better efficiency",
        "Good kick technique: Your kicks are compact and efficient",
    );

    out.judge(
        pose.shoulder_depth_gap() < t.shoulder_rotation,
        "Increase body rotation: Rotate your body more with each stroke for better efficiency",
        "Good body rotation: You're rotating well with each stroke, which helps with efficiency",
    );
}

fn butterfly(pose: &Pose, t: &Thresholds, out: &mut Feedback) {
    let undulation = (pose.left_shoulder.y - pose.left_hip.y).hypot(pose.right_shoulder.y - pose.right_hip.y);
    out.judge(
        undulation < t.shoulder_hip_distance,
        "Increase body undulation: Use more powerful dolphin-like movements",
        "Good body undulation: Your dolphin-like movements are effective",
    );

    out.judge(
        (pose.left_shoulder.y - pose.right_shoulder.y).abs() > t.body_alignment,
        "Synchronize arm movements: Keep both arms moving together",
        "Good arm synchronization: Your arms are moving together well",
    );

    out.judge(
        (pose.left_elbow.z - pose.right_elbow.z).abs() > t.body_alignment,
        "Improve arm recovery: Keep your arms relaxed and follow a straight path over the water",
        "Good arm recovery: Your arms are following a good path over the water",
    );

    // Inverted: the dolphin kick should be big
    out.judge(
        pose.ankle_spread() < t.kick_amplitude,
        "Increase kick power: Use stronger, more rhythmic dolphin kicks",
        "Powerful kick: Your dolphin kicks are strong and rhythmic",
    );

    out.judge(
        (pose.nose.y - pose.shoulder_mid_y()).abs() > t.body_alignment,
        "Improve breathing technique: Keep your head movement minimal and aligned with your body",
        "Good breathing technique: Your head is well-aligned during breathing",
    );

    out.judge(
        (pose.left_elbow.x - pose.right_elbow.x).abs() > t.arm_movement,
        "Improve pull pattern: Keep your pulls symmetrical and avoid crossing the centerline",
        "Effective pull pattern: Your arm pulls are symmetrical and efficient",
    );
}
