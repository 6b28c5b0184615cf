pub mod joint_comparator;
pub mod landmark;
pub mod phase_aligner;
pub mod release_detector;
pub mod scale;
pub mod sequence;
pub mod throw_stage;
