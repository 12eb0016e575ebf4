use intervue_core::proctoring::{Detection, Frame};
use intervue_engine::traits::FrameOracle;
use intervue_providers::detection::{DetectionServiceConfig, build_detect_request};
use intervue_providers::parse::parse_detections;
use intervue_providers::runtime::HttpClient;

/// Object-detection service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFrameOracle {
    cfg: DetectionServiceConfig,
    http: HttpClient,
}

impl HttpFrameOracle {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            cfg: DetectionServiceConfig {
                base_url: base_url.into(),
                api_key: String::new(),
            },
            http: HttpClient::new()?,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.cfg.api_key = api_key.into();
        self
    }
}

#[async_trait::async_trait]
impl FrameOracle for HttpFrameOracle {
    async fn classify(&self, frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        let req = build_detect_request(&self.cfg, frame);
        let resp = self.http.execute(&req).await?.ensure_success("detection")?;
        parse_detections(&resp.body)
    }
}
