use intervue_core::config::{AppConfig, DetectorSettings, InterviewSettings, LlmSettings};

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_DETECTOR_BASE_URL: &str = "http://127.0.0.1:8008";
pub const DEFAULT_DATABASE_PATH: &str = "candidates.db";

pub fn default_app_config() -> AppConfig {
    AppConfig {
        interview: InterviewSettings::default(),
        llm: LlmSettings {
            base_url: DEFAULT_LLM_BASE_URL.into(),
            model: DEFAULT_LLM_MODEL.into(),
        },
        detector: DetectorSettings {
            base_url: DEFAULT_DETECTOR_BASE_URL.into(),
        },
        database_path: DEFAULT_DATABASE_PATH.into(),
        catalog_path: None,
        mock_oracles: false,
        llm_api_key_present: false,
    }
}
