// THEORY:
// Once each clip has a release index, the phase aligner answers "which frame of A
// should be compared with which frame of B?" for a handful of named moments of the
// motion. Each phase is a fixed frame offset from the release (e.g. ten frames before,
// at, and ten frames after), applied to both sides and clamped to the clip.
//
// This is deliberately coarse. It is not dynamic time warping: it assumes both
// performers have a similar local tempo around the release. Near the ends of short
// clips the clamping makes phases collapse onto the first or last frame instead of
// failing.

use serde::{Deserialize, Serialize};

/// A named moment of the motion, as a frame offset from the release event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseOffset {
    pub name: String,
    pub frame_offset: i64,
}

impl PhaseOffset {
    pub fn new(name: impl Into<String>, frame_offset: i64) -> Self {
        Self {
            name: name.into(),
            frame_offset,
        }
    }
}

/// A pair of comparable frame indices for one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPhase {
    pub name: String,
    pub index_a: usize,
    pub index_b: usize,
}

/// Before, at and after the release, ten frames apart.
pub fn default_phases() -> Vec<PhaseOffset> {
    vec![
        PhaseOffset::new("Before release", -10),
        PhaseOffset::new("Release", 0),
        PhaseOffset::new("After release", 10),
    ]
}

fn clamp_index(release: usize, offset: i64, len: usize) -> usize {
    let last = len as i64 - 1;
    (release as i64 + offset).clamp(0, last) as usize
}

/// Frame-index pairs for every phase. Empty if either sequence is empty.
pub fn aligned_indices(
    release_a: usize,
    release_b: usize,
    len_a: usize,
    len_b: usize,
    phases: &[PhaseOffset],
) -> Vec<AlignedPhase> {
    if len_a == 0 || len_b == 0 {
        return Vec::new();
    }

    phases
        .iter()
        .map(|phase| AlignedPhase {
            name: phase.name.clone(),
            index_a: clamp_index(release_a, phase.frame_offset, len_a),
            index_b: clamp_index(release_b, phase.frame_offset, len_b),
        })
        .collect()
}
