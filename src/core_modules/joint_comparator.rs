// THEORY:
// The `JointComparator` is the heart of the critique. It looks at one joint in one
// reference frame and one target frame, removes the effect of body size by dividing by
// each frame's shoulder span, and classifies the remaining difference into a verdict a
// coach would say out loud: "a little low", "much too high", or nothing at all.
//
// Key architectural principles:
// 1.  **Size Invariance**: Positions are compared after dividing by each side's own
//     scale factor, so a child filmed up close and an adult filmed from afar can be
//     compared directly.
// 2.  **Two Lenses**: `ComparisonAxis::Vertical` looks only at image Y, the axis where
//     throwing forms differ most. `ComparisonAxis::Planar` uses the full (x, y)
//     distance and borrows its direction from the vertical component. When the
//     vertical component alone would be aligned, the drift is reported as `Offset`
//     so no height correction is invented.
// 3.  **Tiered Verdicts**: Two thresholds split the deviation into aligned, slight and
//     significant. Image Y grows downwards, so a positive deviation means the target's
//     joint is lower than the reference and the advice is to raise it.
// 4.  **Pure**: No state is kept between calls. Judgments for different joints and
//     phases can be computed in any order, or concurrently.

use crate::core_modules::landmark::{FrameLandmarks, joint_name};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_SLIGHT_THRESHOLD: f64 = 0.05;
pub const DEFAULT_SIGNIFICANT_THRESHOLD: f64 = 0.15;

/// Which measurement of positional difference to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonAxis {
    #[default]
    Vertical,
    Planar,
}

/// Where the target's joint sits relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Target is higher in the frame; it should be lowered.
    Higher,
    /// Target is lower in the frame; it should be raised.
    Lower,
    /// Target is displaced mostly sideways; height is not the problem.
    Offset,
}

impl Direction {
    fn from_deviation(diff: f64) -> Self {
        if diff > 0.0 { Direction::Lower } else { Direction::Higher }
    }

    /// How the target's position relates to the reference.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Higher => "higher than the reference",
            Direction::Lower => "lower than the reference",
            Direction::Offset => "off the reference position",
        }
    }

    /// What the performer should do to correct it.
    pub fn instruction(self) -> &'static str {
        match self {
            Direction::Higher => "lower it",
            Direction::Lower => "raise it",
            Direction::Offset => "bring it closer to the reference position",
        }
    }
}

/// The qualitative classification of one joint's deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Aligned,
    Slightly(Direction),
    Significantly(Direction),
    /// The joint was missing or not confidently detected on one side.
    Undetectable,
}

impl Verdict {
    /// True for every verdict that should appear in a report.
    pub fn is_remark(&self) -> bool {
        !matches!(self, Verdict::Aligned)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Aligned => write!(f, "aligned with the reference"),
            Verdict::Slightly(d) => write!(f, "slightly {} ({})", d.label(), d.instruction()),
            Verdict::Significantly(d) => write!(f, "significantly {} ({})", d.label(), d.instruction()),
            Verdict::Undetectable => write!(f, "not detected"),
        }
    }
}

/// The result of comparing one joint at one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct JointJudgment {
    pub joint: usize,
    pub phase: String,
    /// Signed normalized deviation (target minus reference). `None` when undetectable.
    pub deviation: Option<f64>,
    pub verdict: Verdict,
}

impl JointJudgment {
    pub fn joint_name(&self) -> &'static str {
        joint_name(self.joint)
    }
}

/// Thresholds and measurement mode for joint comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct JointComparator {
    pub axis: ComparisonAxis,
    /// A landmark must be strictly more confident than this to be compared.
    pub visibility_threshold: f64,
    /// Deviations below this are aligned.
    pub slight_threshold: f64,
    /// Deviations at or above this are significant.
    pub significant_threshold: f64,
}

impl Default for JointComparator {
    fn default() -> Self {
        Self {
            axis: ComparisonAxis::Vertical,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            slight_threshold: DEFAULT_SLIGHT_THRESHOLD,
            significant_threshold: DEFAULT_SIGNIFICANT_THRESHOLD,
        }
    }
}

impl JointComparator {
    pub fn with_axis(axis: ComparisonAxis) -> Self {
        Self { axis, ..Self::default() }
    }

    /// Judges `joint` of `target` against the same joint of `reference`.
    pub fn compare(
        &self,
        phase: &str,
        reference: &FrameLandmarks,
        target: &FrameLandmarks,
        joint: usize,
        ref_scale: f64,
        tar_scale: f64,
    ) -> JointJudgment {
        let judged = |deviation: Option<f64>, verdict: Verdict| JointJudgment {
            joint,
            phase: phase.to_string(),
            deviation,
            verdict,
        };

        let (Some(r), Some(t)) = (
            reference.visible(joint, self.visibility_threshold),
            target.visible(joint, self.visibility_threshold),
        ) else {
            return judged(None, Verdict::Undetectable);
        };

        let dy = t.y / tar_scale - r.y / ref_scale;
        match self.axis {
            ComparisonAxis::Vertical => judged(Some(dy), self.classify(dy)),
            ComparisonAxis::Planar => {
                let dx = t.x / tar_scale - r.x / ref_scale;
                let magnitude = (dx * dx + dy * dy).sqrt();
                let direction = if dy.abs() < self.slight_threshold {
                    Direction::Offset
                } else {
                    Direction::from_deviation(dy)
                };
                let diff = if dy < 0.0 { -magnitude } else { magnitude };
                judged(Some(diff), self.tier(magnitude, direction))
            }
        }
    }

    /// Maps a signed vertical deviation onto a verdict.
    pub fn classify(&self, diff: f64) -> Verdict {
        self.tier(diff.abs(), Direction::from_deviation(diff))
    }

    fn tier(&self, magnitude: f64, direction: Direction) -> Verdict {
        if magnitude < self.slight_threshold {
            Verdict::Aligned
        } else if magnitude < self.significant_threshold {
            Verdict::Slightly(direction)
        } else {
            Verdict::Significantly(direction)
        }
    }
}
