use crate::request::{HttpRequest, join_url};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use intervue_core::proctoring::Frame;
use serde_json::json;

#[derive(Clone, PartialEq, Eq)]
pub struct DetectionServiceConfig {
    pub base_url: String,
    // Optional; local detectors usually run without auth.
    pub api_key: String,
}

impl std::fmt::Debug for DetectionServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// `POST {base_url}/detect` with the frame inlined as base64.
pub fn build_detect_request(cfg: &DetectionServiceConfig, frame: &Frame) -> HttpRequest {
    let payload = json!({
        "image": STANDARD.encode(&frame.bytes),
        "mime": frame.mime_type,
    });

    HttpRequest::post_json(join_url(&cfg.base_url, "/detect"), &payload).with_bearer(&cfg.api_key)
}
