use async_trait::async_trait;
use intervue_core::proctoring::{Detection, Frame};
use intervue_core::types::{Candidate, Evaluation, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Text-completion oracle: prompt in, text out.
#[async_trait]
pub trait TextOracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<GeneratedText>;
}

/// Frame-classification oracle: one frame in, labelled detections out.
#[async_trait]
pub trait FrameOracle: Send + Sync {
    async fn classify(&self, frame: &Frame) -> anyhow::Result<Vec<Detection>>;
}

/// Durable record of candidates and final results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn verify_credentials(
        &self,
        user_id: &str,
        secret: &str,
    ) -> anyhow::Result<Option<Candidate>>;

    /// Returns the new result id, or `None` when there was nothing to store.
    async fn save_results(
        &self,
        user_id: &UserId,
        evaluations: &[Evaluation],
        warning_count: u32,
    ) -> anyhow::Result<Option<i64>>;
}
