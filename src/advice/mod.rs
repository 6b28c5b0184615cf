// THEORY:
// The `advice` module is the final layer of the engine: it turns two recorded sequences
// into the text a user reads. Two strategies sit behind one `AdviceComposer` interface
// and can be swapped at run time:
//
// 1.  **LocalComposer** runs the full analysis stack on the machine: release detection
//     on both sides, phase alignment, then a joint-by-joint comparison at each phase.
//     Every non-aligned judgment becomes one line of a report grouped by phase. If no
//     joint earns a remark the report collapses into a single congratulation.
// 2.  **RemoteComposer** summarizes one frame from each side as positional deltas and
//     lets the remote model phrase the critique. Failures are translated into
//     sentences a user can act on rather than surfaced raw.
//
// Both treat an empty sequence as a distinct, explicit case with its own message, never
// as a crash or an empty string. Composers only read the sequences they are given.

pub mod remote;

use crate::config::{ComparisonConfig, PayloadMode};
use crate::core_modules::joint_comparator::JointJudgment;
use crate::core_modules::landmark::FrameLandmarks;
use crate::core_modules::phase_aligner::aligned_indices;
use crate::core_modules::release_detector::ReleaseDetector;
use crate::core_modules::scale::scale_of;
use crate::core_modules::sequence::Sequence;
use crate::error::AdviceError;
use futures::FutureExt;
use futures::future::BoxFuture;
use remote::RemoteAdviceClient;
use tracing::{info, warn};

pub const INSUFFICIENT_DATA_MESSAGE: &str =
    "Not enough pose data was recorded. Play both videos through before comparing.";
pub const NO_FAST_MOTION_MESSAGE: &str =
    "No fast motion was detected. Please perform an arm swing, such as a throw, in both videos.";
pub const CONGRATULATION_MESSAGE: &str =
    "Great form! Your motion matches the reference at every phase.";
pub const BUSY_MESSAGE: &str =
    "The advice service is busy right now. Please wait a little while and try again.";

/// A strategy that turns a reference and a target sequence into user-facing advice.
pub trait AdviceComposer: Send + Sync {
    fn compose_advice<'a>(
        &'a self,
        reference: &'a Sequence,
        target: &'a Sequence,
        selected_joints: &'a [usize],
    ) -> BoxFuture<'a, String>;
}

/// Why the local analysis could not produce judgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisFailure {
    InsufficientData,
    NoReleaseDetected,
}

impl AnalysisFailure {
    pub fn message(self) -> &'static str {
        match self {
            AnalysisFailure::InsufficientData => INSUFFICIENT_DATA_MESSAGE,
            AnalysisFailure::NoReleaseDetected => NO_FAST_MOTION_MESSAGE,
        }
    }
}

/// Rule-based critique computed entirely from the landmark sequences.
#[derive(Debug, Clone, Default)]
pub struct LocalComposer {
    config: ComparisonConfig,
}

impl LocalComposer {
    pub fn new(config: ComparisonConfig) -> Self {
        Self { config }
    }

    /// Every judgment for every phase and joint, in phase order then joint order.
    pub fn judge(
        &self,
        reference: &Sequence,
        target: &Sequence,
        selected_joints: &[usize],
    ) -> Result<Vec<JointJudgment>, AnalysisFailure> {
        if reference.is_empty() || target.is_empty() {
            return Err(AnalysisFailure::InsufficientData);
        }

        let detector = self.config.release_detector();
        let (Some(release_a), Some(release_b)) = (detector.detect(reference), detector.detect(target)) else {
            warn!(
                reference_frames = reference.len(),
                target_frames = target.len(),
                "no release event detected"
            );
            return Err(AnalysisFailure::NoReleaseDetected);
        };
        info!(release_a, release_b, "comparing motions around release");

        let comparator = self.config.comparator();
        let phases = aligned_indices(release_a, release_b, reference.len(), target.len(), &self.config.phases);

        let mut judgments = Vec::with_capacity(phases.len() * selected_joints.len());
        for phase in &phases {
            let (Some(ref_frame), Some(tar_frame)) = (reference.frame(phase.index_a), target.frame(phase.index_b))
            else {
                continue;
            };
            let (ref_scale, tar_scale) = (scale_of(ref_frame), scale_of(tar_frame));
            for &joint in selected_joints {
                judgments.push(comparator.compare(&phase.name, ref_frame, tar_frame, joint, ref_scale, tar_scale));
            }
        }
        Ok(judgments)
    }

    pub fn compose(&self, reference: &Sequence, target: &Sequence, selected_joints: &[usize]) -> String {
        match self.judge(reference, target, selected_joints) {
            Ok(judgments) => render_report(&judgments),
            Err(failure) => failure.message().to_string(),
        }
    }
}

impl AdviceComposer for LocalComposer {
    fn compose_advice<'a>(
        &'a self,
        reference: &'a Sequence,
        target: &'a Sequence,
        selected_joints: &'a [usize],
    ) -> BoxFuture<'a, String> {
        futures::future::ready(self.compose(reference, target, selected_joints)).boxed()
    }
}

/// Renders remarks grouped by phase, or the congratulation when there are none.
pub fn render_report(judgments: &[JointJudgment]) -> String {
    let mut sections: Vec<(&str, Vec<String>)> = Vec::new();
    for judgment in judgments.iter().filter(|j| j.verdict.is_remark()) {
        let line = format!("- {}: {}", capitalize(judgment.joint_name()), judgment.verdict);
        match sections.iter_mut().find(|(phase, _)| *phase == judgment.phase.as_str()) {
            Some((_, lines)) => lines.push(line),
            None => sections.push((judgment.phase.as_str(), vec![line])),
        }
    }

    if sections.is_empty() {
        return CONGRATULATION_MESSAGE.to_string();
    }

    sections
        .into_iter()
        .map(|(phase, lines)| format!("[{phase}]\n{}", lines.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Delegates phrasing to the remote advice service.
#[derive(Clone)]
pub struct RemoteComposer {
    client: RemoteAdviceClient,
    mode: PayloadMode,
    detector: ReleaseDetector,
}

impl RemoteComposer {
    pub fn new(client: RemoteAdviceClient, comparison: &ComparisonConfig) -> Self {
        let mode = client.config().payload;
        Self {
            client,
            mode,
            detector: comparison.release_detector(),
        }
    }

    /// The frame of `sequence` that the payload is built from.
    fn payload_frame<'a>(&self, sequence: &'a Sequence) -> Option<&'a FrameLandmarks> {
        match self.mode {
            PayloadMode::LatestFrame => sequence.latest(),
            PayloadMode::ReleaseFrame => self
                .detector
                .detect(sequence)
                .and_then(|i| sequence.frame(i))
                .or_else(|| sequence.latest()),
        }
    }
}

/// The sentence shown for a failed remote call.
pub fn failure_message(error: &AdviceError) -> String {
    match error {
        AdviceError::Busy { .. } => BUSY_MESSAGE.to_string(),
        other => format!("An error occurred while generating advice: {other}"),
    }
}

impl AdviceComposer for RemoteComposer {
    fn compose_advice<'a>(
        &'a self,
        reference: &'a Sequence,
        target: &'a Sequence,
        _selected_joints: &'a [usize],
    ) -> BoxFuture<'a, String> {
        async move {
            let (Some(ref_frame), Some(tar_frame)) = (self.payload_frame(reference), self.payload_frame(target)) else {
                return INSUFFICIENT_DATA_MESSAGE.to_string();
            };

            match self.client.fetch_advice(ref_frame, tar_frame).await {
                Ok(advice) => advice,
                Err(error) => {
                    warn!(%error, "remote advice failed");
                    failure_message(&error)
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::remote::tests::{ScriptedTransport, success_body, test_config};
    use super::*;
    use crate::core_modules::joint_comparator::{Direction, Verdict};
    use crate::core_modules::landmark::{LEFT_SHOULDER, LEFT_WRIST, Landmark, RIGHT_ELBOW, RIGHT_SHOULDER, RIGHT_WRIST};
    use crate::core_modules::sequence::TimedFrame;

    /// A 30-frame throw: the right wrist sweeps forward and jumps at frame 15.
    fn throw(wrist_y: impl Fn(usize) -> f64, scale: f64) -> Sequence {
        (0..30)
            .map(|i| {
                let mut frame = FrameLandmarks::empty();
                let x = if i < 15 { 0.3 + 0.005 * i as f64 } else { 0.7 + 0.005 * i as f64 };
                let point = |x: f64, y: f64, v: f64| Some(Landmark::new(x * scale, y * scale, 0.0, v));
                frame.set(LEFT_SHOULDER, point(0.4, 0.3, 0.9));
                frame.set(RIGHT_SHOULDER, point(0.6, 0.3, 0.9));
                frame.set(RIGHT_ELBOW, point(0.65, 0.35, 0.9));
                frame.set(RIGHT_WRIST, point(x, wrist_y(i), 0.9));
                frame.set(LEFT_WRIST, point(0.35, 0.5, 0.9));
                TimedFrame {
                    landmarks: frame,
                    timestamp: i as f64 * 0.1,
                }
            })
            .collect()
    }

    const JOINTS: [usize; 2] = [RIGHT_ELBOW, RIGHT_WRIST];

    #[test]
    fn identical_motions_are_congratulated() {
        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|_| 0.4, 1.0);

        let composer = LocalComposer::default();
        let judgments = composer.judge(&reference, &target, &JOINTS).expect("judgments");
        assert_eq!(judgments.len(), 6);
        assert!(judgments.iter().all(|j| j.verdict == Verdict::Aligned));
        assert_eq!(composer.compose(&reference, &target, &JOINTS), CONGRATULATION_MESSAGE);
    }

    #[test]
    fn deviations_are_listed_under_their_phase() {
        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|i| if i >= 15 { 0.5 } else { 0.4 }, 1.0);

        let report = LocalComposer::default().compose(&reference, &target, &JOINTS);
        assert!(!report.contains("[Before release]"));
        assert!(report.contains("[Release]\n- Right wrist: significantly lower than the reference (raise it)"));
        assert!(report.contains("[After release]"));
        assert!(!report.contains("Right elbow"));
    }

    #[test]
    fn empty_target_reports_insufficient_data() {
        let reference = throw(|_| 0.4, 1.0);
        let report = LocalComposer::default().compose(&reference, &Sequence::default(), &JOINTS);
        assert_eq!(report, INSUFFICIENT_DATA_MESSAGE);
    }

    #[test]
    fn short_clip_asks_for_an_arm_swing() {
        let reference = throw(|_| 0.4, 1.0);
        let short: Sequence = reference.frames()[..3].iter().cloned().collect();
        let report = LocalComposer::default().compose(&reference, &short, &JOINTS);
        assert_eq!(report, NO_FAST_MOTION_MESSAGE);
    }

    #[test]
    fn static_clips_ask_for_an_arm_swing() {
        let still = throw(|_| 0.4, 1.0).frames()[..1].to_vec();
        let frozen = |n: usize| -> Sequence {
            (0..n)
                .map(|i| TimedFrame {
                    landmarks: still[0].landmarks.clone(),
                    timestamp: i as f64 * 0.1,
                })
                .collect()
        };
        let composer = LocalComposer::default();
        assert_eq!(composer.judge(&frozen(20), &frozen(20), &JOINTS), Err(AnalysisFailure::NoReleaseDetected));
        assert_eq!(composer.compose(&frozen(20), &frozen(20), &JOINTS), NO_FAST_MOTION_MESSAGE);
    }

    #[test]
    fn invisible_joint_is_undetectable_at_every_phase() {
        let reference = throw(|_| 0.4, 1.0);
        let mut target = Sequence::new(0.0);
        for (i, frame) in reference.frames().iter().enumerate() {
            let mut landmarks = frame.landmarks.clone();
            landmarks.set(RIGHT_ELBOW, Some(Landmark::new(0.65, 0.35, 0.0, 0.0)));
            target.record(&landmarks, i as f64);
        }

        let judgments = LocalComposer::default().judge(&reference, &target, &JOINTS).expect("judgments");
        let elbow: Vec<_> = judgments.iter().filter(|j| j.joint == RIGHT_ELBOW).collect();
        assert_eq!(elbow.len(), 3);
        assert!(elbow.iter().all(|j| j.verdict == Verdict::Undetectable));

        let report = LocalComposer::default().compose(&reference, &target, &JOINTS);
        assert!(report.contains("- Right elbow: not detected"));
    }

    #[test]
    fn verdicts_do_not_depend_on_subject_size() {
        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|i| 0.4 + 0.01 * i as f64, 1.0);
        let composer = LocalComposer::default();
        let original = composer.judge(&reference, &target, &JOINTS).expect("judgments");

        let scaled = composer
            .judge(&throw(|_| 0.4, 1.7), &throw(|i| 0.4 + 0.01 * i as f64, 1.7), &JOINTS)
            .expect("judgments");

        let verdicts = |js: &[JointJudgment]| js.iter().map(|j| j.verdict).collect::<Vec<_>>();
        assert_eq!(verdicts(&original), verdicts(&scaled));
        assert!(original.iter().any(|j| j.verdict == Verdict::Significantly(Direction::Lower)));
    }

    #[test]
    fn local_composition_is_deterministic() {
        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|i| 0.45 + 0.002 * i as f64, 1.0);
        let composer = LocalComposer::default();
        let first = composer.compose(&reference, &target, &JOINTS);
        let second = composer.compose(&reference, &target, &JOINTS);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn strategies_are_interchangeable() {
        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|_| 0.4, 1.0);

        let transport = ScriptedTransport::new(vec![(200, success_body("Keep your elbow high."))]);
        let client = RemoteAdviceClient::new(test_config(), transport.clone()).expect("client");
        let strategies: Vec<Box<dyn AdviceComposer>> = vec![
            Box::new(LocalComposer::default()),
            Box::new(RemoteComposer::new(client, &ComparisonConfig::default())),
        ];

        let mut outputs = Vec::new();
        for strategy in &strategies {
            outputs.push(strategy.compose_advice(&reference, &target, &JOINTS).await);
        }
        assert_eq!(outputs, vec![CONGRATULATION_MESSAGE.to_string(), "Keep your elbow high.".to_string()]);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn remote_composer_exits_early_without_data() {
        let transport = ScriptedTransport::new(vec![(200, success_body("unused"))]);
        let client = RemoteAdviceClient::new(test_config(), transport.clone()).expect("client");
        let composer = RemoteComposer::new(client, &ComparisonConfig::default());

        let advice = composer
            .compose_advice(&throw(|_| 0.4, 1.0), &Sequence::default(), &JOINTS)
            .await;
        assert_eq!(advice, INSUFFICIENT_DATA_MESSAGE);
        assert_eq!(transport.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn remote_composer_translates_busy_service() {
        let transport = ScriptedTransport::new(vec![(429, String::new())]);
        let client = RemoteAdviceClient::new(test_config(), transport.clone()).expect("client");
        let composer = RemoteComposer::new(client, &ComparisonConfig::default());

        let advice = composer
            .compose_advice(&throw(|_| 0.4, 1.0), &throw(|_| 0.5, 1.0), &JOINTS)
            .await;
        assert_eq!(advice, BUSY_MESSAGE);
        assert_eq!(transport.attempts(), 4);
    }

    #[tokio::test]
    async fn remote_composer_reports_terminal_errors() {
        let transport = ScriptedTransport::new(vec![(403, "forbidden".to_string())]);
        let client = RemoteAdviceClient::new(test_config(), transport).expect("client");
        let composer = RemoteComposer::new(client, &ComparisonConfig::default());

        let advice = composer
            .compose_advice(&throw(|_| 0.4, 1.0), &throw(|_| 0.5, 1.0), &JOINTS)
            .await;
        assert!(advice.starts_with("An error occurred while generating advice:"));
        assert!(advice.contains("403"));
    }

    #[tokio::test]
    async fn release_frame_payload_uses_detected_release() {
        let transport = ScriptedTransport::new(vec![(200, success_body("ok"))]);
        let mut config = test_config();
        config.payload = PayloadMode::ReleaseFrame;
        let client = RemoteAdviceClient::new(config, transport.clone()).expect("client");
        let composer = RemoteComposer::new(client, &ComparisonConfig::default());

        let reference = throw(|_| 0.4, 1.0);
        let target = throw(|i| if i == 15 { 0.6 } else { 0.4 }, 1.0);
        composer.compose_advice(&reference, &target, &JOINTS).await;

        let requests = transport.requests.lock().expect("requests lock");
        let prompt = requests[0].1["contents"][0]["parts"][0]["text"].as_str().expect("prompt").to_string();
        assert!(prompt.contains(r#"{"id":16,"dx":0.0,"dy":0.2}"#));
    }
}
