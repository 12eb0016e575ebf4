use crate::prompts::NAME_SENTINEL;
use regex::Regex;
use std::sync::OnceLock;

fn thinking_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<thinking>.*?</thinking>|<think>.*?</think>|<reasoning>.*?</reasoning>")
            .expect("valid thinking regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]{2,}").expect("valid whitespace regex"))
}

/// Strips reasoning blocks some models emit and trims the result.
pub fn filter_oracle_output(text: &str) -> String {
    let out = thinking_re().replace_all(text, "");
    let out = whitespace_re().replace_all(&out, " ");
    out.trim().to_string()
}

/// Reduces a name-extraction reply to a single bare name.
///
/// Returns `None` for the sentinel, an empty reply, or anything that does not
/// start with a letter.
pub fn extract_name(reply: &str) -> Option<String> {
    let cleaned = filter_oracle_output(reply);
    let token = cleaned
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'');

    if token.is_empty() || token.eq_ignore_ascii_case(NAME_SENTINEL) {
        return None;
    }
    // Older prompts used "Candidate" as the fallback token.
    if token.eq_ignore_ascii_case("candidate") {
        return None;
    }
    if !token.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_filter_strips_thinking() {
        let input = "<thinking>plan</thinking>\nHello   there";
        assert_eq!(filter_oracle_output(input), "Hello there");
    }

    #[test]
    fn extracts_bare_name() {
        assert_eq!(extract_name("Priya\n").as_deref(), Some("Priya"));
        assert_eq!(extract_name("\"Amit.\"").as_deref(), Some("Amit"));
    }

    #[test]
    fn sentinel_and_empty_yield_none() {
        assert_eq!(extract_name("unknown"), None);
        assert_eq!(extract_name("Unknown."), None);
        assert_eq!(extract_name("Candidate"), None);
        assert_eq!(extract_name("   "), None);
        assert_eq!(extract_name("42"), None);
    }
}
