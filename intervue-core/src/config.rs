use crate::catalog::SelectionPlan;
use crate::proctoring::{DEFAULT_DETECTION_THRESHOLD, DEFAULT_MAX_WARNINGS, DEFAULT_SAMPLE_EVERY};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_PROBE_QUESTIONS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewSettings {
    pub hard_questions: usize,
    pub other_questions: usize,
    pub max_probe_questions: u32,
    pub max_warnings: u32,
    pub frame_sample_every: u64,
    pub detection_threshold: f32,

    // Answers are refused while the interview runs without a live camera.
    #[serde(default = "default_true")]
    pub require_camera_for_answers: bool,
}

fn default_true() -> bool {
    true
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            hard_questions: 2,
            other_questions: 8,
            max_probe_questions: DEFAULT_MAX_PROBE_QUESTIONS,
            max_warnings: DEFAULT_MAX_WARNINGS,
            frame_sample_every: DEFAULT_SAMPLE_EVERY,
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            require_camera_for_answers: true,
        }
    }
}

impl InterviewSettings {
    pub fn selection_plan(&self) -> SelectionPlan {
        SelectionPlan {
            hard: self.hard_questions,
            other: self.other_questions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub interview: InterviewSettings,
    pub llm: LlmSettings,
    pub detector: DetectorSettings,
    pub database_path: String,

    // Falls back to the bundled catalog when unset.
    #[serde(default)]
    pub catalog_path: Option<String>,

    // Canned oracle replies; no network and no API key required.
    #[serde(default)]
    pub mock_oracles: bool,

    // Secrets are stored outside this struct at rest.
    #[serde(default)]
    pub llm_api_key_present: bool,
}
