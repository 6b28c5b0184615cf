// THEORY:
// Two people filmed at different distances produce landmark clouds of different sizes.
// The scale normalizer measures the shoulder span of a frame and the comparator divides
// positions by it, so deviations are expressed in "shoulder widths" rather than in
// fractions of the image. When the shoulders cannot be trusted it falls back to the
// identity scale: the comparison degrades to raw coordinates instead of failing.

use crate::core_modules::landmark::{FrameLandmarks, LEFT_SHOULDER, RIGHT_SHOULDER};

/// Minimum shoulder confidence for the span to be used as a scale.
pub const SHOULDER_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Body-scale factor of one frame: the planar shoulder span, or `1.0` when unavailable.
///
/// Never returns zero or a negative value.
pub fn scale_of(frame: &FrameLandmarks) -> f64 {
    let left = frame.visible(LEFT_SHOULDER, SHOULDER_VISIBILITY_THRESHOLD);
    let right = frame.visible(RIGHT_SHOULDER, SHOULDER_VISIBILITY_THRESHOLD);

    match (left, right) {
        (Some(l), Some(r)) => {
            let span = l.planar_distance(r);
            if span > 0.0 && span.is_finite() { span } else { 1.0 }
        }
        _ => 1.0,
    }
}
