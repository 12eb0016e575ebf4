use intervue_core::prompts::INTERVIEWER_PERSONA;
use intervue_engine::traits::{GeneratedText, TextOracle};
use intervue_providers::openai_compatible::{OpenAiCompatibleChatConfig, build_generate_request};
use intervue_providers::parse::parse_openai_chat_completion;
use intervue_providers::runtime::HttpClient;

#[derive(Clone)]
pub struct OpenAiCompatibleTextOracle {
    cfg: OpenAiCompatibleChatConfig,
    http: HttpClient,
}

impl std::fmt::Debug for OpenAiCompatibleTextOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleTextOracle")
            .field("base_url", &self.cfg.base_url)
            .field("model", &self.cfg.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAiCompatibleTextOracle {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            cfg: OpenAiCompatibleChatConfig {
                base_url: base_url.into(),
                api_key: api_key.into(),
                model: model.into(),
            },
            http: HttpClient::new()?,
        })
    }
}

#[async_trait::async_trait]
impl TextOracle for OpenAiCompatibleTextOracle {
    async fn generate(&self, prompt: &str) -> anyhow::Result<GeneratedText> {
        let req = build_generate_request(&self.cfg, INTERVIEWER_PERSONA, prompt);
        let resp = self
            .http
            .execute(&req)
            .await?
            .ensure_success("OpenAI-compatible")?;

        let text = parse_openai_chat_completion(&resp.body)?;
        Ok(GeneratedText {
            text,
            provider: "openai-compatible".into(),
            model: self.cfg.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_persona_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": INTERVIEWER_PERSONA},
                    {"role": "user", "content": "Say hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"choices":[{"message":{"content":"Hello!"}}]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let oracle = OpenAiCompatibleTextOracle::new(server.uri(), "sk-test", "gpt-4o-mini").unwrap();
        let out = oracle.generate("Say hello").await.unwrap();
        assert_eq!(out.text, "Hello!");
        assert_eq!(out.provider, "openai-compatible");
        assert_eq!(out.model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let oracle = OpenAiCompatibleTextOracle::new(server.uri(), "nope", "m").unwrap();
        let err = oracle.generate("hi").await.unwrap_err();
        assert!(format!("{err:#}").contains("status=401"));
    }

    #[test]
    fn debug_hides_api_key() {
        let oracle = OpenAiCompatibleTextOracle::new("https://x", "sk-secret", "m").unwrap();
        assert!(!format!("{oracle:?}").contains("sk-secret"));
    }
}
