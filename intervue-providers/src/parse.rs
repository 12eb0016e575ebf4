use anyhow::{Context, anyhow};
use intervue_core::proctoring::Detection;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

pub fn parse_openai_chat_completion(body: &[u8]) -> anyhow::Result<String> {
    let resp: OpenAiChatResponse = serde_json::from_slice(body).context("decode chat JSON")?;
    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("no content in chat completion response"))?;
    Ok(content)
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    label: String,
    // Some detectors call it `score`.
    #[serde(alias = "score")]
    confidence: f32,
}

pub fn parse_detections(body: &[u8]) -> anyhow::Result<Vec<Detection>> {
    let resp: DetectResponse = serde_json::from_slice(body).context("decode detection JSON")?;
    Ok(resp
        .detections
        .into_iter()
        .map(|d| Detection::new(d.label, d.confidence))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_openai_chat_content() {
        let body = br#"{"choices":[{"message":{"content":"hi"}}]}"#;
        assert_eq!(parse_openai_chat_completion(body).unwrap(), "hi");
    }

    #[test]
    fn openai_missing_content_errors() {
        let body = br#"{"choices":[{"message":{}}]}"#;
        assert!(parse_openai_chat_completion(body).is_err());
        assert!(parse_openai_chat_completion(br#"{"choices":[]}"#).is_err());
    }

    #[test]
    fn parses_detections_with_either_confidence_key() {
        let body = br#"{"detections":[{"label":"person","confidence":0.97},{"label":"cell phone","score":0.91}]}"#;
        let d = parse_detections(body).unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].label, "person");
        assert_eq!(d[1].label, "cell phone");
        assert!((d[1].confidence - 0.91).abs() < 1e-6);
    }

    #[test]
    fn empty_detection_body_is_no_detections() {
        assert!(parse_detections(b"{}").unwrap().is_empty());
        assert!(parse_detections(b"not json").is_err());
    }
}
