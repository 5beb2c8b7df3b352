//! Planar geometry over landmarks
//!
//! Everything here works on the image plane (x, y); depth is only read
//! directly by the rules that need it.

use crate::pose::Landmark;

/// Angle at `b` between the rays to `a` and `c`, in degrees (0-180)
///
/// Coincident points give a zero-length ray; that case returns 0.
pub fn angle(a: Landmark, b: Landmark, c: Landmark) -> f64 {
    let ba = (a.x - b.x, a.y - b.y);
    let bc = (c.x - b.x, c.y - b.y);

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let norms = ba.0.hypot(ba.1) * bc.0.hypot(bc.1);
    if norms == 0.0 {
        return 0.0;
    }

    (dot / norms).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Inclination of the torso in degrees
///
/// Fits a least-squares line through both shoulders and both hips and
/// returns `atan(slope)`. A perfectly vertical torso (all x equal) is 90.
pub fn body_line_angle(
    left_shoulder: Landmark,
    right_shoulder: Landmark,
    left_hip: Landmark,
    right_hip: Landmark,
) -> f64 {
    let points = [left_shoulder, right_shoulder, left_hip, right_hip];
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let (sxy, sxx) = points.iter().fold((0.0f64, 0.0f64), |(sxy, sxx), p| {
        let dx = p.x - mean_x;
        (sxy + dx * (p.y - mean_y), sxx + dx * dx)
    });

    if sxx == 0.0 {
        return 90.0;
    }

    (sxy / sxx).atan().to_degrees()
}

/// Euclidean distance in the image plane
pub fn distance(a: Landmark, b: Landmark) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Average height of two landmarks
pub fn mid_y(a: Landmark, b: Landmark) -> f64 {
    (a.y + b.y) / 2.0
}
