// THEORY:
// Single-frame cues for live feedback while a clip plays. They need no history and no
// alignment, so they can run on every detector callback: one reads the stage of a
// right-handed throw from the arm's geometry, the other says whether two performers'
// right wrists are currently in roughly the same place. They are intentionally crude
// and are not a substitute for the phase-aligned comparison.

use crate::core_modules::landmark::{FrameLandmarks, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST};

/// How far past the shoulder (in image x) the wrist must be to count as thrown.
pub const THROWN_WRIST_OFFSET: f64 = 0.1;
/// Planar wrist distance below which two poses count as matching.
pub const WRIST_MATCH_DISTANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrowStage {
    /// Wrist and elbow raised above the shoulder.
    ReadyToThrow,
    /// Wrist carried forward past the shoulder.
    Thrown,
    Waiting,
    Undetectable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WristMatch {
    Similar,
    Different,
    Undetectable,
}

/// Reads the stage of a right-handed throw from one frame.
pub fn classify_throw_stage(frame: &FrameLandmarks) -> ThrowStage {
    let (Some(wrist), Some(elbow), Some(shoulder)) = (
        frame.get(RIGHT_WRIST),
        frame.get(RIGHT_ELBOW),
        frame.get(RIGHT_SHOULDER),
    ) else {
        return ThrowStage::Undetectable;
    };

    if wrist.y < shoulder.y && elbow.y < shoulder.y {
        ThrowStage::ReadyToThrow
    } else if wrist.x > shoulder.x + THROWN_WRIST_OFFSET {
        ThrowStage::Thrown
    } else {
        ThrowStage::Waiting
    }
}

/// Compares the right wrists of two live frames.
pub fn wrist_match(a: &FrameLandmarks, b: &FrameLandmarks) -> WristMatch {
    match (a.get(RIGHT_WRIST), b.get(RIGHT_WRIST)) {
        (Some(wa), Some(wb)) if wa.planar_distance(wb) < WRIST_MATCH_DISTANCE => WristMatch::Similar,
        (Some(_), Some(_)) => WristMatch::Different,
        _ => WristMatch::Undetectable,
    }
}
