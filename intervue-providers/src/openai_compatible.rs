use crate::request::{HttpRequest, join_url};
use serde_json::json;

#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiCompatibleChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for OpenAiCompatibleChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleChatConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

pub fn build_chat_completions_request(
    cfg: &OpenAiCompatibleChatConfig,
    messages: &[ChatMessage],
) -> HttpRequest {
    let payload = json!({
        "model": cfg.model,
        "messages": messages.iter().map(|m| json!({"role": m.role, "content": m.content})).collect::<Vec<_>>(),
        "temperature": 0.3,
    });

    HttpRequest::post_json(join_url(&cfg.base_url, "/chat/completions"), &payload)
        .with_bearer(&cfg.api_key)
}

/// One-shot generation: persona as the system message, prompt as the user turn.
pub fn build_generate_request(
    cfg: &OpenAiCompatibleChatConfig,
    persona: &str,
    prompt: &str,
) -> HttpRequest {
    let mut messages = Vec::with_capacity(2);
    if !persona.trim().is_empty() {
        messages.push(ChatMessage::system(persona));
    }
    messages.push(ChatMessage::user(prompt));
    build_chat_completions_request(cfg, &messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Body;

    fn cfg() -> OpenAiCompatibleChatConfig {
        OpenAiCompatibleChatConfig {
            base_url: "https://api.example.com/v1".into(),
            api_key: "k".into(),
            model: "gpt-4o-mini".into(),
        }
    }

    #[test]
    fn builds_authorized_json_request() {
        let req = build_chat_completions_request(&cfg(), &[ChatMessage::user("hi")]);

        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "https://api.example.com/v1/chat/completions");
        assert_eq!(req.header("authorization"), Some("Bearer k"));
        match req.body {
            Body::Json(s) => assert!(s.contains("\"model\"")),
            _ => panic!("expected json"),
        }
    }

    #[test]
    fn generate_request_puts_persona_first() {
        let req = build_generate_request(&cfg(), "You are Alex.", "Say hello");
        let Body::Json(s) = req.body else {
            panic!("expected json");
        };
        let v: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][0]["content"], "You are Alex.");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["messages"][1]["content"], "Say hello");
    }

    #[test]
    fn debug_hides_api_key() {
        let mut c = cfg();
        c.api_key = "sk-secret".into();
        assert!(!format!("{c:?}").contains("sk-secret"));
    }
}
