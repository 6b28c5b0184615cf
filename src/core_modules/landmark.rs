// THEORY:
// The `landmark` module is the most fundamental unit of the comparison engine. It is a
// "dumb" data layer describing what the external pose detector hands us: one frame of
// the 33-point body model, each point carrying a normalized position and a detection
// confidence. Nothing in here compares frames or knows about time; that belongs to the
// higher layers (`sequence`, `release_detector`, `joint_comparator`).
//
// Key architectural principles:
// 1.  **Explicit Absence**: A detector may skip a point entirely. Instead of relying on
//     missing properties, every slot in a frame is an `Option<Landmark>`. A present
//     point with a low `visibility` is still present; callers decide what confidence
//     they require through `FrameLandmarks::visible`.
// 2.  **Fixed Indexing**: Points are addressed by the detector's own index (0 = nose,
//     11/12 = shoulders, 15/16 = wrists, ...). The constants below name the ones the
//     engine reasons about, so no magic numbers leak into the analysis code.
// 3.  **Owned Snapshots**: A `FrameLandmarks` owns its data. The detector is free to
//     reuse its buffers on the next callback because the sequence buffer stores a copy.

use serde::{Deserialize, Serialize};

/// The number of points in the body model produced by the detector.
pub const POSE_LANDMARK_COUNT: usize = 33;

pub const NOSE: usize = 0;
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// Both wrists, in the order the release detector scans them.
pub const WRISTS: [usize; 2] = [LEFT_WRIST, RIGHT_WRIST];

const JOINT_NAMES: [&str; POSE_LANDMARK_COUNT] = [
    "nose",
    "left eye (inner)",
    "left eye",
    "left eye (outer)",
    "right eye (inner)",
    "right eye",
    "right eye (outer)",
    "left ear",
    "right ear",
    "mouth (left)",
    "mouth (right)",
    "left shoulder",
    "right shoulder",
    "left elbow",
    "right elbow",
    "left wrist",
    "right wrist",
    "left pinky",
    "right pinky",
    "left index",
    "right index",
    "left thumb",
    "right thumb",
    "left hip",
    "right hip",
    "left knee",
    "right knee",
    "left ankle",
    "right ankle",
    "left heel",
    "right heel",
    "left foot index",
    "right foot index",
];

/// Human-readable name of a body-model index, used when rendering feedback.
pub fn joint_name(index: usize) -> &'static str {
    JOINT_NAMES.get(index).copied().unwrap_or("unknown joint")
}

/// A single tracked body point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, roughly 0..1 from the left edge. Detector noise can push it outside.
    pub x: f64,
    /// Vertical position, roughly 0..1 from the top edge. Larger values are lower in the frame.
    pub y: f64,
    /// Relative depth reported by the detector. Not used by the planar analysis.
    pub z: f64,
    /// Detection confidence in 0..1.
    #[serde(default)]
    pub visibility: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self { x, y, z, visibility }
    }

    /// Euclidean distance in the image plane, ignoring depth.
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// One detector result: an index-addressable list of optional landmarks.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameLandmarks {
    points: Vec<Option<Landmark>>,
}

impl FrameLandmarks {
    /// A frame with every slot of the body model empty.
    pub fn empty() -> Self {
        Self { points: vec![None; POSE_LANDMARK_COUNT] }
    }

    /// Builds a frame from a complete detector output where every point is present.
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Self {
        Self { points: landmarks.into_iter().map(Some).collect() }
    }

    pub fn from_slots(points: Vec<Option<Landmark>>) -> Self {
        Self { points }
    }

    /// True when the detector found no body at all.
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index).and_then(Option::as_ref)
    }

    /// The landmark at `index`, but only if its confidence is strictly above `threshold`.
    pub fn visible(&self, index: usize, threshold: f64) -> Option<&Landmark> {
        self.get(index).filter(|lm| lm.visibility > threshold)
    }

    /// Places `landmark` at `index`, growing the slot list if needed.
    pub fn set(&mut self, index: usize, landmark: Option<Landmark>) {
        if index >= self.points.len() {
            self.points.resize(index + 1, None);
        }
        self.points[index] = landmark;
    }

    /// Iterates over `(index, landmark)` for every present slot.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Landmark)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|lm| (i, lm)))
    }
}
