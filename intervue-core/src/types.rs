use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Mid,
    Hard,
}

impl Difficulty {
    /// Mid and hard answers get a probe question before scoring.
    pub fn warrants_probe(self) -> bool {
        matches!(self, Difficulty::Mid | Difficulty::Hard)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub level: Difficulty,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub question: String,
    pub level: Difficulty,
    pub topic: String,
    pub score: u8,
    pub feedback: String,
}

impl Evaluation {
    pub fn for_question(question: &Question, score: u8, feedback: impl Into<String>) -> Self {
        Self {
            question: question.text.clone(),
            level: question.level,
            topic: question.topic.clone(),
            score,
            feedback: feedback.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    AwaitingStart,
    BotIntroduction,
    AwaitingAnswer,
    AwaitingPsychResponse,
    InterviewComplete,
    Terminated,
    TerminatedCamera,
}

impl Stage {
    // A stable string label for UI display and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::AwaitingStart => "AWAITING_START",
            Stage::BotIntroduction => "BOT_INTRODUCTION",
            Stage::AwaitingAnswer => "AWAITING_ANSWER",
            Stage::AwaitingPsychResponse => "AWAITING_PSYCH_RESPONSE",
            Stage::InterviewComplete => "INTERVIEW_COMPLETE",
            Stage::Terminated => "TERMINATED",
            Stage::TerminatedCamera => "TERMINATED_CAMERA",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Stage::InterviewComplete | Stage::Terminated | Stage::TerminatedCamera
        )
    }

    /// Started and not yet finished; proctoring applies only here.
    pub fn is_running(self) -> bool {
        !self.is_terminal() && self != Stage::AwaitingStart
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_terminal_and_running_are_disjoint() {
        assert!(!Stage::AwaitingStart.is_running());
        assert!(!Stage::AwaitingStart.is_terminal());
        assert!(Stage::AwaitingPsychResponse.is_running());
        for s in [
            Stage::InterviewComplete,
            Stage::Terminated,
            Stage::TerminatedCamera,
        ] {
            assert!(s.is_terminal());
            assert!(!s.is_running());
        }
    }

    #[test]
    fn question_uses_catalog_field_names() {
        let q: Question = serde_json::from_str(
            r#"{"question":"What does VLOOKUP do?","level":"mid","topic":"Lookup"}"#,
        )
        .unwrap();
        assert_eq!(q.level, Difficulty::Mid);
        assert_eq!(q.text, "What does VLOOKUP do?");
        assert!(q.level.warrants_probe());
        assert!(!Difficulty::Easy.warrants_probe());
    }

    #[test]
    fn stage_serializes_screaming_snake() {
        let s = serde_json::to_string(&Stage::TerminatedCamera).unwrap();
        assert_eq!(s, "\"TERMINATED_CAMERA\"");
    }
}
