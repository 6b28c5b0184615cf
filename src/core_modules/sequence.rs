// THEORY:
// The `sequence` module gives the engine its memory. The detector fires a callback for
// every decoded video frame, far more often than the analysis needs and sometimes with
// nothing in it. A `Sequence` turns that noisy stream into an ordered, de-duplicated
// history of poses for one side of the comparison (the reference or the target).
//
// Key architectural principles:
// 1.  **Append-Only**: A sequence only grows. It is owned by the capture pipeline of its
//     side while recording and is read-only once handed to the comparator, so no
//     locking is needed between writer and readers.
// 2.  **Minimum Spacing**: A frame is kept only if it is more than `min_interval`
//     seconds away from the last kept frame. The interval is small by default so the
//     release detector still sees the fast part of the motion.
// 3.  **Unbounded**: No cap on length is enforced here. Callers bound the recording by
//     the duration of the video they feed in.

use crate::core_modules::landmark::FrameLandmarks;
use tracing::debug;

/// Default spacing between kept frames, in seconds.
pub const DEFAULT_MIN_RECORD_INTERVAL: f64 = 0.05;

/// One kept sample: a copy of the detector output and the video time it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedFrame {
    pub landmarks: FrameLandmarks,
    /// Capture time in seconds, non-decreasing within a sequence.
    pub timestamp: f64,
}

/// The ordered pose history for one side of a comparison.
#[derive(Debug, Clone)]
pub struct Sequence {
    frames: Vec<TimedFrame>,
    min_interval: f64,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RECORD_INTERVAL)
    }
}

impl Sequence {
    pub fn new(min_interval: f64) -> Self {
        Self {
            frames: Vec::new(),
            min_interval,
        }
    }

    /// Offers one detector result to the buffer.
    ///
    /// Returns `true` if the frame was kept. Empty detections are ignored, the first
    /// frame is always kept, and later frames are kept only when they are more than
    /// `min_interval` seconds away from the last kept one.
    pub fn record(&mut self, landmarks: &FrameLandmarks, timestamp: f64) -> bool {
        if landmarks.is_empty() {
            return false;
        }

        if let Some(last) = self.frames.last() {
            if (timestamp - last.timestamp).abs() <= self.min_interval {
                return false;
            }
        }

        self.frames.push(TimedFrame {
            landmarks: landmarks.clone(),
            timestamp,
        });
        debug!(timestamp, frames = self.frames.len(), "recorded landmark frame");
        true
    }

    /// Drops every frame so the buffer can be rebuilt for a new comparison run.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn min_interval(&self) -> f64 {
        self.min_interval
    }

    pub fn frames(&self) -> &[TimedFrame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&FrameLandmarks> {
        self.frames.get(index).map(|f| &f.landmarks)
    }

    /// The most recently kept frame.
    pub fn latest(&self) -> Option<&FrameLandmarks> {
        self.frames.last().map(|f| &f.landmarks)
    }
}

impl FromIterator<TimedFrame> for Sequence {
    /// Collects already-spaced frames verbatim, without applying the recording rules.
    fn from_iter<I: IntoIterator<Item = TimedFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
            min_interval: DEFAULT_MIN_RECORD_INTERVAL,
        }
    }
}
