use crate::prompts::DEFAULT_FEEDBACK;
use crate::types::Evaluation;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

pub const MAX_SCORE_PER_QUESTION: u32 = 5;

#[derive(Debug, Error)]
pub enum ScoreParseError {
    #[error("scoring reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("score {0} is not a whole number")]
    NotInteger(f64),

    #[error("score {0} is outside 1..=5")]
    OutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScore {
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
struct RawScore {
    // `4.0` is accepted as `4`.
    score: f64,
    #[serde(default)]
    feedback: Option<String>,
}

fn fenced_json_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid fence regex")
    })
}

/// Returns the JSON payload of a scoring reply.
///
/// This is the only lenient step of score parsing: if the reply contains a
/// fenced code block (optionally tagged `json`) wrapping an object, the object
/// is returned; otherwise the whole reply, trimmed.
pub fn strip_code_fence(reply: &str) -> &str {
    match fenced_json_re().captures(reply).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => reply.trim(),
    }
}

/// Parses a scoring reply into `{score, feedback}`.
///
/// The score must be a whole number in `1..=5`. A missing or blank feedback
/// falls back to a neutral acknowledgement.
pub fn parse_score_response(reply: &str) -> Result<ParsedScore, ScoreParseError> {
    let raw: RawScore = serde_json::from_str(strip_code_fence(reply))?;
    if raw.score.fract() != 0.0 {
        return Err(ScoreParseError::NotInteger(raw.score));
    }
    let score = raw.score as i64;
    if !(1..=i64::from(MAX_SCORE_PER_QUESTION)).contains(&score) {
        return Err(ScoreParseError::OutOfRange(score));
    }

    let feedback = raw
        .feedback
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| DEFAULT_FEEDBACK.to_string());

    Ok(ParsedScore {
        score: score as u8,
        feedback,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_score: u32,
    pub max_score: u32,
    pub final_percentage: f64,
    pub question_count: usize,
}

impl ScoreSummary {
    /// Max score is 5 per evaluated question; an empty list yields 0%.
    pub fn from_evaluations(evaluations: &[Evaluation]) -> Self {
        let total_score: u32 = evaluations.iter().map(|e| u32::from(e.score)).sum();
        let max_score = evaluations.len() as u32 * MAX_SCORE_PER_QUESTION;
        let final_percentage = if max_score > 0 {
            f64::from(total_score) / f64::from(max_score) * 100.0
        } else {
            0.0
        };

        Self {
            total_score,
            max_score,
            final_percentage,
            question_count: evaluations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question_count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Low,
    Borderline,
    Strong,
}

impl ScoreBand {
    pub fn for_score(score: u8) -> Self {
        match score {
            0..=2 => ScoreBand::Low,
            3 => ScoreBand::Borderline,
            _ => ScoreBand::Strong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Question};

    fn eval(score: u8) -> Evaluation {
        let q = Question {
            text: "q".into(),
            level: Difficulty::Easy,
            topic: "t".into(),
        };
        Evaluation::for_question(&q, score, "f")
    }

    #[test]
    fn parses_fenced_json() {
        let parsed =
            parse_score_response("```json\n{\"score\": 4, \"feedback\": \"Good\"}\n```").unwrap();
        assert_eq!(
            parsed,
            ParsedScore {
                score: 4,
                feedback: "Good".into()
            }
        );
    }

    #[test]
    fn parses_bare_and_untagged_fence() {
        let bare = parse_score_response("  {\"score\": 2, \"feedback\": \"Missing detail\"} ");
        assert_eq!(bare.unwrap().score, 2);

        let untagged = parse_score_response("Here:\n```\n{\"score\": 5, \"feedback\": \"x\"}\n```");
        assert_eq!(untagged.unwrap().score, 5);
    }

    #[test]
    fn rejects_non_json_and_out_of_range() {
        assert!(matches!(
            parse_score_response("not json"),
            Err(ScoreParseError::Json(_))
        ));
        assert!(matches!(
            parse_score_response("{\"score\": 9, \"feedback\": \"x\"}"),
            Err(ScoreParseError::OutOfRange(9))
        ));
        assert!(parse_score_response("{\"feedback\": \"no score\"}").is_err());
        assert!(parse_score_response("{\"score\": \"4\"}").is_err());
    }

    #[test]
    fn whole_number_floats_are_scores() {
        let parsed = parse_score_response("{\"score\": 4.0, \"feedback\": \"Good\"}").unwrap();
        assert_eq!(parsed.score, 4);
        assert!(matches!(
            parse_score_response("{\"score\": 3.5, \"feedback\": \"x\"}"),
            Err(ScoreParseError::NotInteger(_))
        ));
        assert!(matches!(
            parse_score_response("{\"score\": 0.0}"),
            Err(ScoreParseError::OutOfRange(0))
        ));
    }

    #[test]
    fn blank_feedback_falls_back() {
        let parsed = parse_score_response("{\"score\": 3, \"feedback\": \"  \"}").unwrap();
        assert_eq!(parsed.feedback, DEFAULT_FEEDBACK);
        let parsed = parse_score_response("{\"score\": 3}").unwrap();
        assert_eq!(parsed.feedback, DEFAULT_FEEDBACK);
    }

    #[test]
    fn summary_totals_and_percentage() {
        let s = ScoreSummary::from_evaluations(&[eval(5), eval(2)]);
        assert_eq!(s.total_score, 7);
        assert_eq!(s.max_score, 10);
        assert!((s.final_percentage - 70.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_is_zero_percent() {
        let s = ScoreSummary::from_evaluations(&[]);
        assert!(s.is_empty());
        assert_eq!(s.max_score, 0);
        assert_eq!(s.final_percentage, 0.0);
    }

    #[test]
    fn bands_follow_score() {
        assert_eq!(ScoreBand::for_score(1), ScoreBand::Low);
        assert_eq!(ScoreBand::for_score(3), ScoreBand::Borderline);
        assert_eq!(ScoreBand::for_score(4), ScoreBand::Strong);
    }
}
