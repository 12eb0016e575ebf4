//! Canned oracles for running without network access or an API key.

use intervue_core::prompts::NAME_SENTINEL;
use intervue_core::proctoring::{Detection, Frame, PERSON_LABEL};
use intervue_engine::traits::{FrameOracle, GeneratedText, TextOracle};

const MOCK_GREETING: &str = "Hello, I am Alex, an AI interviewer. Please introduce yourself.";
const MOCK_EVALUATION: &str = r#"{"score": 3, "feedback": "This is mock feedback."}"#;
const MOCK_PROBE_TRANSITION: &str = "Okay, noted. Let's review.";
const MOCK_SUMMARY: &str = "This is a mock summary.";
const MOCK_GENERIC: &str = "This is a generic mock response.";

#[derive(Debug, Clone, Default)]
pub struct MockTextOracle {
    first_name: Option<String>,
}

impl MockTextOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name extraction answers with the first word of `full_name`.
    pub fn for_candidate(full_name: &str) -> Self {
        Self {
            first_name: full_name.split_whitespace().next().map(str::to_string),
        }
    }

    fn reply_for(&self, prompt: &str) -> String {
        if prompt.contains("Introduce yourself as Alex") {
            MOCK_GREETING.to_string()
        } else if prompt.contains("extract the user's first name") {
            self.first_name
                .clone()
                .unwrap_or_else(|| NAME_SENTINEL.to_string())
        } else if prompt.contains("They have just introduced themselves")
            || prompt.contains("did not clearly state a name")
        {
            match &self.first_name {
                Some(name) => format!("Thank you, {name}. Let's begin."),
                None => "Thank you. Let's begin.".to_string(),
            }
        } else if prompt.contains("Excel interview evaluator") {
            MOCK_EVALUATION.to_string()
        } else if prompt.contains("You asked:") {
            MOCK_PROBE_TRANSITION.to_string()
        } else if prompt.contains("senior hiring manager") {
            MOCK_SUMMARY.to_string()
        } else {
            MOCK_GENERIC.to_string()
        }
    }
}

#[async_trait::async_trait]
impl TextOracle for MockTextOracle {
    async fn generate(&self, prompt: &str) -> anyhow::Result<GeneratedText> {
        Ok(GeneratedText {
            text: self.reply_for(prompt),
            provider: "mock".into(),
            model: "mock".into(),
        })
    }
}

/// Always sees exactly one person.
#[derive(Debug, Clone, Default)]
pub struct MockFrameOracle;

#[async_trait::async_trait]
impl FrameOracle for MockFrameOracle {
    async fn classify(&self, _frame: &Frame) -> anyhow::Result<Vec<Detection>> {
        Ok(vec![Detection::new(PERSON_LABEL, 0.99)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervue_core::prompts;
    use intervue_core::scoring::parse_score_response;
    use intervue_core::text::extract_name;
    use intervue_core::types::{Difficulty, Question};

    #[tokio::test]
    async fn answers_each_prompt_kind() {
        let oracle = MockTextOracle::for_candidate("Priya Sharma");

        let greeting = oracle.generate(prompts::GREETING_PROMPT).await.unwrap();
        assert_eq!(greeting.text, MOCK_GREETING);

        let name = oracle
            .generate(&prompts::name_extraction_prompt("Hi, I'm Priya."))
            .await
            .unwrap();
        assert_eq!(extract_name(&name.text).as_deref(), Some("Priya"));

        let transition = oracle
            .generate(&prompts::intro_transition_prompt(Some("Priya")))
            .await
            .unwrap();
        assert_eq!(transition.text, "Thank you, Priya. Let's begin.");

        let q = Question {
            text: "What does SUM do?".into(),
            level: Difficulty::Easy,
            topic: "Formulas".into(),
        };
        let eval = oracle
            .generate(&prompts::evaluation_prompt(&q, "adds"))
            .await
            .unwrap();
        let parsed = parse_score_response(&eval.text).unwrap();
        assert_eq!(parsed.score, 3);

        let summary = oracle
            .generate(&prompts::final_report_prompt(&[]).unwrap())
            .await
            .unwrap();
        assert_eq!(summary.text, MOCK_SUMMARY);
    }

    #[tokio::test]
    async fn anonymous_mock_returns_sentinel_name() {
        let oracle = MockTextOracle::new();
        let name = oracle
            .generate(&prompts::name_extraction_prompt("hello"))
            .await
            .unwrap();
        assert_eq!(extract_name(&name.text), None);
    }
}
