// THEORY:
// The `release_detector` finds the single most salient instant of a recorded motion:
// the frame where a tracked joint moved the furthest since the previous frame. For a
// throw this is the release of the ball, and it becomes the anchor that lets two clips
// of different length and start offset be compared at the same point of the motion.
//
// Key architectural principles:
// 1.  **Velocity, Not Intent**: It does not try to work out which hand is throwing.
//     Every candidate joint is checked on every frame pair, and whichever moves fastest
//     at any instant can define the peak.
// 2.  **Deterministic**: Frame pairs are scanned in sequence order and joints in list
//     order. A later candidate must be strictly faster to replace the current peak, so
//     the first maximum wins.
// 3.  **Soft Failure**: Too little data, no joint ever visible in two consecutive
//     frames, or a peak no faster than `min_speed` yields `None` rather than an error.
//     The caller turns that into guidance.
// 4.  **Confidence Gate**: Detectors emit every point even when they cannot see it, so
//     a joint only counts in a frame pair when both samples clear the visibility
//     threshold. Jitter of an unseen wrist never becomes the anchor.

use crate::core_modules::joint_comparator::DEFAULT_VISIBILITY_THRESHOLD;
use crate::core_modules::landmark::WRISTS;
use crate::core_modules::sequence::Sequence;

/// Fewer frames than this cannot describe a transient event reliably.
pub const MIN_FRAMES_FOR_RELEASE: usize = 5;
/// A peak displacement at or below this (normalized units per frame pair) is not motion.
pub const DEFAULT_MIN_RELEASE_SPEED: f64 = 0.01;

/// The fastest displacement found in a sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleasePeak {
    /// Index of the later frame of the fastest pair.
    pub index: usize,
    /// The joint that produced the peak.
    pub joint: usize,
    /// Planar displacement between the two frames, in normalized image units.
    pub speed: f64,
}

/// Scans a sequence for its peak-velocity frame.
#[derive(Debug, Clone)]
pub struct ReleaseDetector {
    pub joints: Vec<usize>,
    pub min_frames: usize,
    /// Both samples of a pair must be strictly more confident than this.
    pub visibility_threshold: f64,
    /// The peak must be strictly faster than this to count as a release.
    pub min_speed: f64,
}

impl Default for ReleaseDetector {
    fn default() -> Self {
        Self {
            joints: WRISTS.to_vec(),
            min_frames: MIN_FRAMES_FOR_RELEASE,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            min_speed: DEFAULT_MIN_RELEASE_SPEED,
        }
    }
}

impl ReleaseDetector {
    pub fn new(joints: Vec<usize>) -> Self {
        Self {
            joints,
            ..Self::default()
        }
    }

    /// Full detail of the peak, or `None` when no peak can be judged.
    pub fn find_peak(&self, sequence: &Sequence) -> Option<ReleasePeak> {
        if sequence.len() < self.min_frames {
            return None;
        }

        let mut peak: Option<ReleasePeak> = None;
        for (i, pair) in sequence.frames().windows(2).enumerate() {
            let (prev, curr) = (&pair[0].landmarks, &pair[1].landmarks);
            for &joint in &self.joints {
                let (Some(a), Some(b)) = (
                    prev.visible(joint, self.visibility_threshold),
                    curr.visible(joint, self.visibility_threshold),
                ) else {
                    continue;
                };
                let speed = a.planar_distance(b);
                if peak.is_none_or(|p| speed > p.speed) {
                    peak = Some(ReleasePeak {
                        index: i + 1,
                        joint,
                        speed,
                    });
                }
            }
        }
        peak.filter(|p| p.speed > self.min_speed)
    }

    pub fn detect(&self, sequence: &Sequence) -> Option<usize> {
        self.find_peak(sequence).map(|p| p.index)
    }
}

/// Index of the frame of maximum joint velocity among `joints`.
pub fn detect_peak_velocity_frame(sequence: &Sequence, joints: &[usize]) -> Option<usize> {
    ReleaseDetector::new(joints.to_vec()).detect(sequence)
}
