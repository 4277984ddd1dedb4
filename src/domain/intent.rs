//! Caller intent classification
//!
//! A pure keyword classifier. Keyword sets are tested in a fixed
//! declared order and the first matching set wins, so classification
//! is deterministic even when an utterance matches several sets.

use serde::{Deserialize, Serialize};

/// What the caller is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Schedule,
    Quote,
    Hours,
    Location,
    Human,
    Services,
    Status,
    Emergency,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::Schedule => "schedule",
            Intent::Quote => "quote",
            Intent::Hours => "hours",
            Intent::Location => "location",
            Intent::Human => "human",
            Intent::Services => "services",
            Intent::Status => "status",
            Intent::Emergency => "emergency",
            Intent::General => "general",
        }
    }
}

/// Keyword sets, in match order
const KEYWORD_SETS: &[(Intent, &[&str])] = &[
    (
        Intent::Schedule,
        &["schedule", "appointment", "book", "available", "come out", "visit"],
    ),
    (
        Intent::Quote,
        &["quote", "estimate", "price", "cost", "how much"],
    ),
    (Intent::Hours, &["hours", "open", "close", "when"]),
    (
        Intent::Location,
        &["where", "address", "located", "directions"],
    ),
    (
        Intent::Human,
        &["speak", "person", "human", "representative", "someone", "operator"],
    ),
    (
        Intent::Services,
        &["services", "offer", "do you do", "specialize"],
    ),
    (
        Intent::Status,
        &["my project", "status", "update", "when will"],
    ),
    (
        Intent::Emergency,
        &["emergency", "urgent", "asap", "right now", "today"],
    ),
];

/// Classify an utterance
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();

    for (intent, keywords) in KEYWORD_SETS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *intent;
        }
    }

    Intent::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("I'd like to schedule an appointment"), Intent::Schedule);
        assert_eq!(classify("what's your price for granite"), Intent::Quote);
        assert_eq!(
            classify("I need someone right now, this is urgent"),
            Intent::Human
        );
        assert_eq!(classify("this is urgent, come quick"), Intent::Emergency);
        assert_eq!(classify("what are your hours"), Intent::Hours);
        assert_eq!(classify("where are you located"), Intent::Location);
        assert_eq!(classify("can I talk to a representative"), Intent::Human);
        assert_eq!(classify("what services do you offer"), Intent::Services);
        assert_eq!(classify("any update on my project"), Intent::Status);
        assert_eq!(classify("tell me about granite patterns"), Intent::General);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("SCHEDULE me please"), Intent::Schedule);
        assert_eq!(classify("EMERGENCY"), Intent::Emergency);
    }

    #[test]
    fn test_first_matching_set_wins() {
        // "quote" and "emergency" both match; quote is declared earlier
        assert_eq!(
            classify("emergency quote needed"),
            Intent::Quote
        );
        // "book" (schedule) beats "cost" (quote)
        assert_eq!(classify("book a visit, what's the cost"), Intent::Schedule);
    }

    #[test]
    fn test_classify_is_pure() {
        let text = "can I get a quote for countertops";
        let first = classify(text);
        for _ in 0..10 {
            assert_eq!(classify(text), first);
        }
        assert_eq!(first, Intent::Quote);
    }

    #[test]
    fn test_empty_input_is_general() {
        assert_eq!(classify(""), Intent::General);
        assert_eq!(classify("   "), Intent::General);
    }
}
