use crate::types::{Evaluation, Question};

/// System message sent with every text-oracle request.
pub const INTERVIEWER_PERSONA: &str = "You are an expert AI interviewer named 'Alex'. \
Your specialty is assessing Microsoft Excel skills. You are professional, methodical, and \
encouraging. Your mission is to conduct a structured interview, evaluate responses, and provide \
a final summary.";

pub const GREETING_PROMPT: &str = "Introduce yourself as Alex, an AI interviewer. Briefly explain \
that this interview will test their Excel skills. Then, ask the candidate to briefly introduce \
themselves.";

/// Token the name-extraction prompt asks for when no name is present.
pub const NAME_SENTINEL: &str = "unknown";

pub const PROBE_QUESTIONS: [&str; 4] = [
    "Are you satisfied with that answer?",
    "Is that your final answer?",
    "How confident are you in that explanation?",
    "Would you like to add any more details to that?",
];

pub const TRANSITION_PHRASES: [&str; 5] = [
    "Alright, next question for you.",
    "Okay, let's move on to the next one.",
    "Here is your next question.",
    "Let's try this one.",
    "Okay, moving on.",
];

pub const FALLBACK_GREETING: &str = "Hello, I am Alex, an AI interviewer. This interview will \
test your Excel skills. Please introduce yourself.";
pub const GENERIC_INTRO_TRANSITION: &str =
    "Great, thank you for that introduction. Let's begin with the first question.";
pub const DEFAULT_FEEDBACK: &str = "Okay, noted.";
pub const SCORING_APOLOGY: &str =
    "Sorry, there was an issue processing that response. Let's move on.";
pub const FINAL_QUESTION_NOTICE: &str =
    "That was the final question. Please submit the interview to see your evaluation.";
pub const SUMMARY_UNAVAILABLE: &str =
    "The overall summary could not be generated. Please review the detailed breakdown below.";

pub fn name_extraction_prompt(introduction: &str) -> String {
    format!(
        "From the following text, extract the user's first name. If a name is not clearly \
mentioned, respond with the word \"{NAME_SENTINEL}\". Respond with only the single name.\n\n\
Text: \"{introduction}\""
    )
}

/// `name` is `None` when extraction produced the sentinel or failed.
pub fn intro_transition_prompt(name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "You are the interviewer, Alex. The candidate's name is {name}. They have just \
introduced themselves.\nYour task is to create a short, encouraging transition phrase before \
starting the first question. Address them by their name."
        ),
        None => format!(
            "You are the interviewer, Alex. The candidate has just introduced themselves but did \
not clearly state a name.\nYour task is to create a short, encouraging transition phrase before \
starting the first question, such as \"{GENERIC_INTRO_TRANSITION}\". Do not address them by \
any name."
        ),
    }
}

pub fn evaluation_prompt(question: &Question, answer: &str) -> String {
    format!(
        "**Persona:** You are an expert Excel interview evaluator.\n\
**Context:** The candidate was asked: \"{question}\"\n\
**Candidate's Answer:** \"{answer}\"\n\n\
**Your Task:**\n\
Provide your evaluation in a pure JSON format with two keys: \"score\" (integer 1-5) and \
\"feedback\" (a brief, constructive sentence).\n\
**RULE:**\n\
- If score is <= 3, 'feedback' MUST be detailed, stating what was missing.\n\
- If score is >= 4, 'feedback' can be a brief confirmation.",
        question = question.text,
    )
}

pub fn probe_reply_transition_prompt(probe_question: &str, reply: &str) -> String {
    format!(
        "You are Alex. You asked: \"{probe_question}\" The candidate responded: \"{reply}\"\n\
Generate a brief, natural-sounding transition phrase before you provide the evaluation.\n\
- If they seem confident, say something like \"Great, confidence is key.\"\n\
- If they seem uncertain, say something encouraging like \"No problem, let's review your \
answer together.\"\n\
Keep your response to a single sentence."
    )
}

pub fn final_report_prompt(evaluations: &[Evaluation]) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string(evaluations)?;
    Ok(format!(
        "**Persona:** You are a senior hiring manager.\n\
**Interview Data:** {data}\n\
**Your Task:** Write a final performance summary paragraph based on the data."
    ))
}

/// Transition phrase and question text, separated by a blank line.
pub fn framed_question(transition: &str, question: &Question) -> String {
    format!("{transition}\n\n{}", question.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn question() -> Question {
        Question {
            text: "What does SUMIF do?".into(),
            level: Difficulty::Easy,
            topic: "Formulas".into(),
        }
    }

    #[test]
    fn evaluation_prompt_embeds_question_and_answer() {
        let p = evaluation_prompt(&question(), "It sums with a condition");
        assert!(p.contains("What does SUMIF do?"));
        assert!(p.contains("It sums with a condition"));
        assert!(p.contains("\"score\""));
    }

    #[test]
    fn intro_transition_without_name_never_mentions_sentinel() {
        let p = intro_transition_prompt(None);
        assert!(!p.contains(NAME_SENTINEL));
        assert!(intro_transition_prompt(Some("Priya")).contains("Priya"));
    }

    #[test]
    fn final_report_serializes_evaluations() {
        let evals = vec![Evaluation::for_question(&question(), 4, "Good")];
        let p = final_report_prompt(&evals).unwrap();
        assert!(p.contains("\"score\":4"));
        assert!(p.contains("\"topic\":\"Formulas\""));
    }

    #[test]
    fn framed_question_separates_with_blank_line() {
        let text = framed_question("Okay, moving on.", &question());
        assert_eq!(text, "Okay, moving on.\n\nWhat does SUMIF do?");
    }
}
