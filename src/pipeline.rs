// THEORY:
// The `pipeline` module is the top-level API of the engine. A `ComparisonSession`
// replaces the loose global buffers of a page script with one explicit object that owns
// both sides of a comparison and is passed to whoever needs it.
//
// Key architectural principles:
// 1.  **Single Writer per Side**: Each side's detector callback feeds its own sequence
//     through `record`. Composition only borrows the sequences immutably, so the borrow
//     checker enforces that no frame is appended while a comparison is reading.
// 2.  **Caller-Driven Timing**: The session does not know when both videos have
//     finished. The caller decides when to call `compose`, and `reset` clears both
//     sides for the next run.
// 3.  **Strategy Injection**: The session does not pick between local and remote
//     advice; any `AdviceComposer` can be handed in.

use crate::advice::AdviceComposer;
use crate::config::ComparisonConfig;
use crate::core_modules::landmark::FrameLandmarks;
use crate::core_modules::sequence::Sequence;
use crate::core_modules::throw_stage::{ThrowStage, WristMatch, classify_throw_stage, wrist_match};
use tracing::info;

// Re-export key data structures for the public API.
pub use crate::core_modules::joint_comparator::{Direction, JointJudgment, Verdict};

/// Which clip a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The model motion.
    Reference,
    /// The motion being evaluated.
    Target,
}

/// Single-frame cues computed from the latest frame of each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveReport {
    pub reference_stage: ThrowStage,
    pub target_stage: ThrowStage,
    pub wrists: WristMatch,
}

/// Owns both sequences of one comparison run.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    reference: Sequence,
    target: Sequence,
    selected_joints: Vec<usize>,
}

impl Default for ComparisonSession {
    fn default() -> Self {
        Self::new(&ComparisonConfig::default())
    }
}

impl ComparisonSession {
    pub fn new(config: &ComparisonConfig) -> Self {
        Self {
            reference: Sequence::new(config.min_record_interval),
            target: Sequence::new(config.min_record_interval),
            selected_joints: config.selected_joints.clone(),
        }
    }

    /// Feeds one detector result for `side`. Returns whether it was kept.
    pub fn record(&mut self, side: Side, landmarks: &FrameLandmarks, timestamp: f64) -> bool {
        self.sequence_mut(side).record(landmarks, timestamp)
    }

    /// Clears both sides before a new comparison run.
    pub fn reset(&mut self) {
        self.reference.clear();
        self.target.clear();
    }

    pub fn sequence(&self, side: Side) -> &Sequence {
        match side {
            Side::Reference => &self.reference,
            Side::Target => &self.target,
        }
    }

    fn sequence_mut(&mut self, side: Side) -> &mut Sequence {
        match side {
            Side::Reference => &mut self.reference,
            Side::Target => &mut self.target,
        }
    }

    pub fn selected_joints(&self) -> &[usize] {
        &self.selected_joints
    }

    pub fn set_selected_joints(&mut self, joints: Vec<usize>) {
        self.selected_joints = joints;
    }

    /// Live cues from the most recent frame of each side, once both have one.
    pub fn live_report(&self) -> Option<LiveReport> {
        let (reference, target) = (self.reference.latest()?, self.target.latest()?);
        Some(LiveReport {
            reference_stage: classify_throw_stage(reference),
            target_stage: classify_throw_stage(target),
            wrists: wrist_match(reference, target),
        })
    }

    /// Runs `composer` over the recorded sequences.
    pub async fn compose(&self, composer: &dyn AdviceComposer) -> String {
        info!(
            reference_frames = self.reference.len(),
            target_frames = self.target.len(),
            joints = self.selected_joints.len(),
            "starting comparison"
        );
        composer
            .compose_advice(&self.reference, &self.target, &self.selected_joints)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{CONGRATULATION_MESSAGE, INSUFFICIENT_DATA_MESSAGE, LocalComposer};
    use crate::core_modules::landmark::{Landmark, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST};

    fn arm_frame(wrist_x: f64, wrist_y: f64) -> FrameLandmarks {
        let mut frame = FrameLandmarks::empty();
        frame.set(RIGHT_SHOULDER, Some(Landmark::new(0.5, 0.4, 0.0, 0.9)));
        frame.set(RIGHT_ELBOW, Some(Landmark::new(0.55, 0.5, 0.0, 0.9)));
        frame.set(RIGHT_WRIST, Some(Landmark::new(wrist_x, wrist_y, 0.0, 0.9)));
        frame
    }

    fn play(session: &mut ComparisonSession, side: Side) {
        for i in 0..40 {
            let x = if i < 20 { 0.5 } else { 0.8 };
            session.record(side, &arm_frame(x, 0.6), i as f64 / 30.0);
        }
    }

    #[test]
    fn sides_are_recorded_independently() {
        let mut session = ComparisonSession::default();
        assert!(session.record(Side::Reference, &arm_frame(0.5, 0.6), 0.0));
        assert!(!session.record(Side::Reference, &arm_frame(0.5, 0.6), 0.01));
        assert!(session.record(Side::Target, &arm_frame(0.5, 0.6), 0.01));

        assert_eq!(session.sequence(Side::Reference).len(), 1);
        assert_eq!(session.sequence(Side::Target).len(), 1);
    }

    #[test]
    fn live_report_needs_both_sides() {
        let mut session = ComparisonSession::default();
        session.record(Side::Reference, &arm_frame(0.7, 0.6), 0.0);
        assert!(session.live_report().is_none());

        session.record(Side::Target, &arm_frame(0.5, 0.6), 0.0);
        let live = session.live_report().expect("both sides recorded");
        assert_eq!(live.reference_stage, ThrowStage::Thrown);
        assert_eq!(live.target_stage, ThrowStage::Waiting);
        assert_eq!(live.wrists, WristMatch::Different);
    }

    #[tokio::test]
    async fn full_run_then_reset() {
        let mut session = ComparisonSession::default();
        session.set_selected_joints(vec![RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST]);
        play(&mut session, Side::Reference);
        play(&mut session, Side::Target);

        let composer = LocalComposer::default();
        assert_eq!(session.compose(&composer).await, CONGRATULATION_MESSAGE);

        session.reset();
        assert!(session.sequence(Side::Reference).is_empty());
        assert_eq!(session.compose(&composer).await, INSUFFICIENT_DATA_MESSAGE);
    }
}
