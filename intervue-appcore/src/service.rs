use std::path::PathBuf;
use std::sync::Arc;

use intervue_core::config::AppConfig;
use intervue_core::prompts::{SUMMARY_UNAVAILABLE, final_report_prompt};
use intervue_core::scoring::{ScoreBand, ScoreSummary};
use intervue_core::text::filter_oracle_output;
use intervue_core::types::{Candidate, Stage, UserId};
use intervue_engine::actor::{SessionError, SessionHandle};
use intervue_engine::session::SessionSnapshot;
use intervue_engine::traits::ResultStore;
use intervue_runtime::config_store::ConfigStore;
use intervue_runtime::runtime_engine::{InterviewRuntime, build_runtime_from_config};
use intervue_runtime::secrets::{SecretKey, delete_secret, get_secret, set_secret};
use intervue_runtime::store::StoredResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NO_EVALUATIONS_NOTICE: &str = "No evaluations were recorded for this interview.";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid user id or password")]
    InvalidCredentials,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("result store: {0:#}")]
    Store(anyhow::Error),
}

/// One line of the per-question breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub number: usize,
    pub topic: String,
    pub question: String,
    pub score: u8,
    pub band: ScoreBand,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub stage: Stage,
    // Set once the results have been persisted.
    pub result_id: Option<i64>,
    pub summary: ScoreSummary,
    pub rows: Vec<ReportRow>,
    pub warning_count: u32,
    pub narrative: String,
}

impl EvaluationReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Clone)]
pub struct AppService {
    runtime: Arc<InterviewRuntime>,
    config_store: Option<ConfigStore>,
}

impl AppService {
    pub fn new(runtime: InterviewRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
            config_store: None,
        }
    }

    /// Loads (or initializes) the config file and validates the runtime it describes.
    pub fn from_config_path(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_store = ConfigStore::at_path(config_path);
        let cfg = config_store.load_or_init()?;
        let runtime = build_runtime_from_config(cfg)?;
        Ok(Self {
            runtime: Arc::new(runtime),
            config_store: Some(config_store),
        })
    }

    pub fn config(&self) -> &AppConfig {
        self.runtime.config()
    }

    /// Persists `cfg`; takes effect the next time the service is built.
    pub fn save_config(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        match &self.config_store {
            Some(store) => store.save(cfg),
            None => Err(anyhow::anyhow!("service was built without a config file")),
        }
    }

    // Usable before a runtime exists.
    pub fn set_llm_api_key(value: &str) -> anyhow::Result<()> {
        set_secret(SecretKey::LlmApiKey, value.trim())
    }

    pub fn get_llm_api_key_present() -> anyhow::Result<bool> {
        Ok(get_secret(SecretKey::LlmApiKey)?.is_some())
    }

    pub fn set_detector_api_key(value: &str) -> anyhow::Result<()> {
        set_secret(SecretKey::DetectorApiKey, value.trim())
    }

    pub fn get_detector_api_key_present() -> anyhow::Result<bool> {
        Ok(get_secret(SecretKey::DetectorApiKey)?.is_some())
    }

    pub fn clear_api_keys() -> anyhow::Result<()> {
        delete_secret(SecretKey::LlmApiKey)?;
        delete_secret(SecretKey::DetectorApiKey)?;
        Ok(())
    }

    pub async fn login(&self, user_id: &str, secret: &str) -> Result<Candidate, ServiceError> {
        let user_id = user_id.trim();
        let candidate = self
            .runtime
            .store()
            .verify_credentials(user_id, secret)
            .await
            .map_err(ServiceError::Store)?;

        match candidate {
            Some(c) => {
                log::info!("{} logged in", c.user_id.as_str());
                Ok(c)
            }
            None => {
                log::warn!("failed login for {user_id}");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    /// Spawns a session for `candidate` and applies the start event.
    pub async fn start_interview(&self, candidate: Candidate) -> Result<SessionHandle, ServiceError> {
        let engine = self.runtime.build_engine(&candidate);
        let session = engine.new_session(candidate);
        let handle = SessionHandle::spawn(engine, session, self.runtime.frame_oracle());
        handle.start_session().await?;
        Ok(handle)
    }

    /// Persists the finished interview and builds its report.
    pub async fn submit_for_grading(
        &self,
        handle: &SessionHandle,
    ) -> Result<EvaluationReport, ServiceError> {
        let receipt = handle.submit_for_grading().await?;
        let snapshot = handle.snapshot().await?;

        let mut report = self.evaluation_report(&snapshot).await;
        report.result_id = receipt.result_id;
        Ok(report)
    }

    pub async fn evaluation_report(&self, snapshot: &SessionSnapshot) -> EvaluationReport {
        let summary = ScoreSummary::from_evaluations(&snapshot.evaluations);
        let rows: Vec<ReportRow> = snapshot
            .evaluations
            .iter()
            .enumerate()
            .map(|(i, e)| ReportRow {
                number: i + 1,
                topic: e.topic.clone(),
                question: e.question.clone(),
                score: e.score,
                band: ScoreBand::for_score(e.score),
                feedback: e.feedback.clone(),
            })
            .collect();

        let narrative = if rows.is_empty() {
            NO_EVALUATIONS_NOTICE.to_string()
        } else {
            self.narrative_for(snapshot).await
        };

        EvaluationReport {
            stage: snapshot.stage,
            result_id: None,
            summary,
            rows,
            warning_count: snapshot.warning_count,
            narrative,
        }
    }

    pub async fn results_history(&self, user_id: &UserId) -> Result<Vec<StoredResult>, ServiceError> {
        self.runtime
            .store()
            .results_for(user_id)
            .await
            .map_err(ServiceError::Store)
    }

    async fn narrative_for(&self, snapshot: &SessionSnapshot) -> String {
        let prompt = match final_report_prompt(&snapshot.evaluations) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("encode evaluations for summary: {e}");
                return SUMMARY_UNAVAILABLE.to_string();
            }
        };

        match self.runtime.text_oracle().generate(&prompt).await {
            Ok(out) => {
                let text = filter_oracle_output(&out.text);
                if text.is_empty() {
                    SUMMARY_UNAVAILABLE.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                log::warn!("summary generation failed: {e:#}");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}
