// THEORY:
// One explicit, typed configuration object replaces the scattered tunables of a
// browser prototype. It is plain data: every field has a documented default, so the
// engine runs without any file, and a TOML file can override any subset of it. The
// advice API key is the only value with no usable default; it is resolved once, when
// the remote client is built, and its absence is reported then.

use crate::core_modules::joint_comparator::{
    ComparisonAxis, DEFAULT_SIGNIFICANT_THRESHOLD, DEFAULT_SLIGHT_THRESHOLD, DEFAULT_VISIBILITY_THRESHOLD,
    JointComparator,
};
use crate::core_modules::landmark::{RIGHT_ELBOW, RIGHT_HIP, RIGHT_KNEE, RIGHT_SHOULDER, RIGHT_WRIST, WRISTS};
use crate::core_modules::phase_aligner::{PhaseOffset, default_phases};
use crate::core_modules::release_detector::{DEFAULT_MIN_RELEASE_SPEED, MIN_FRAMES_FOR_RELEASE, ReleaseDetector};
use crate::core_modules::sequence::DEFAULT_MIN_RECORD_INTERVAL;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable consulted for the advice API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Top-level configuration, one section per layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub comparison: ComparisonConfig,
    pub advice: AdviceConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Tunables of the recording and comparison layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Minimum spacing in seconds between recorded frames.
    pub min_record_interval: f64,
    pub visibility_threshold: f64,
    pub slight_threshold: f64,
    pub significant_threshold: f64,
    pub axis: ComparisonAxis,
    pub phases: Vec<PhaseOffset>,
    /// Joints critiqued by the local composer.
    pub selected_joints: Vec<usize>,
    /// Joints scanned for the release event.
    pub release_joints: Vec<usize>,
    pub min_release_frames: usize,
    /// Peak wrist displacement per frame pair that must be exceeded to count as a release.
    pub min_release_speed: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            min_record_interval: DEFAULT_MIN_RECORD_INTERVAL,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            slight_threshold: DEFAULT_SLIGHT_THRESHOLD,
            significant_threshold: DEFAULT_SIGNIFICANT_THRESHOLD,
            axis: ComparisonAxis::Vertical,
            phases: default_phases(),
            selected_joints: vec![RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_WRIST, RIGHT_HIP, RIGHT_KNEE],
            release_joints: WRISTS.to_vec(),
            min_release_frames: MIN_FRAMES_FOR_RELEASE,
            min_release_speed: DEFAULT_MIN_RELEASE_SPEED,
        }
    }
}

impl ComparisonConfig {
    pub fn comparator(&self) -> JointComparator {
        JointComparator {
            axis: self.axis,
            visibility_threshold: self.visibility_threshold,
            slight_threshold: self.slight_threshold,
            significant_threshold: self.significant_threshold,
        }
    }

    pub fn release_detector(&self) -> ReleaseDetector {
        ReleaseDetector {
            joints: self.release_joints.clone(),
            min_frames: self.min_release_frames,
            visibility_threshold: self.visibility_threshold,
            min_speed: self.min_release_speed,
        }
    }
}

/// Which frames the remote composer summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadMode {
    /// The most recent frame of each sequence.
    #[default]
    LatestFrame,
    /// The detected release frame of each side, or the latest frame if none is found.
    ReleaseFrame,
}

/// Settings of the remote advice client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdviceConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    /// Human language the critique is requested in.
    pub language: String,
    pub max_retries: u32,
    pub initial_backoff_secs: u64,
    pub request_timeout_secs: u64,
    pub payload: PayloadMode,
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: "English".to_string(),
            max_retries: 3,
            initial_backoff_secs: 2,
            request_timeout_secs: 30,
            payload: PayloadMode::LatestFrame,
        }
    }
}

impl AdviceConfig {
    /// Fills `api_key` from the environment when the file did not provide one.
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }

    /// The `generateContent` URL without credentials.
    pub fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").expect("empty toml");
        assert_eq!(config, Config::default());
        assert_eq!(config.comparison.min_record_interval, 0.05);
        assert_eq!(config.comparison.phases.len(), 3);
        assert_eq!(config.advice.max_retries, 3);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = Config::from_toml(
            r#"
            [comparison]
            axis = "planar"
            min_record_interval = 0.1
            phases = [{ name = "Wind-up", frame_offset = -5 }, { name = "Release", frame_offset = 0 }]

            [advice]
            api_key = "secret"
            payload = "release_frame"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.comparison.axis, ComparisonAxis::Planar);
        assert_eq!(config.comparison.min_record_interval, 0.1);
        assert_eq!(config.comparison.phases[0], PhaseOffset::new("Wind-up", -5));
        assert_eq!(config.comparison.slight_threshold, DEFAULT_SLIGHT_THRESHOLD);
        assert_eq!(config.advice.api_key.as_deref(), Some("secret"));
        assert_eq!(config.advice.payload, PayloadMode::ReleaseFrame);
        assert_eq!(config.advice.model, DEFAULT_MODEL);
    }

    #[test]
    fn comparator_reflects_thresholds() {
        let mut comparison = ComparisonConfig::default();
        comparison.slight_threshold = 0.1;
        comparison.axis = ComparisonAxis::Planar;
        let cmp = comparison.comparator();
        assert_eq!(cmp.slight_threshold, 0.1);
        assert_eq!(cmp.axis, ComparisonAxis::Planar);
    }

    #[test]
    fn release_detector_reflects_gates() {
        let config = Config::from_toml(
            r#"
            [comparison]
            visibility_threshold = 0.7
            min_release_speed = 0.05
            "#,
        )
        .expect("valid toml");
        let detector = config.comparison.release_detector();
        assert_eq!(detector.visibility_threshold, 0.7);
        assert_eq!(detector.min_speed, 0.05);
        assert_eq!(ComparisonConfig::default().release_detector().min_speed, DEFAULT_MIN_RELEASE_SPEED);
    }

    #[test]
    fn generate_url_joins_endpoint_and_model() {
        let advice = AdviceConfig {
            endpoint: "http://localhost:8080/models/".to_string(),
            ..AdviceConfig::default()
        };
        assert_eq!(advice.generate_url(), "http://localhost:8080/models/gemini-pro:generateContent");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load("/nonexistent/form_vision.toml").expect_err("no such file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let path = std::env::temp_dir().join(format!("form_vision_config_{}.toml", std::process::id()));
        let mut config = Config::default();
        config.comparison.selected_joints = vec![RIGHT_WRIST];
        config.save(&path).expect("save");
        let loaded = Config::load(&path).expect("load");
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
