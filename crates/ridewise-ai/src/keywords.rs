//! Rule-based polarity adjustment for rider feedback.
//!
//! Words are matched whole and case-insensitively, so "unprofessional" does not
//! trigger "professional". Each set contributes at most once per text, however
//! many of its words appear.

/// Words that signal a bad ride.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "awful",
    "bad",
    "dangerous",
    "dirty",
    "horrible",
    "late",
    "poor",
    "reckless",
    "rude",
    "slow",
    "terrible",
    "unprofessional",
    "unsafe",
    "worst",
];

/// Words that signal a good ride.
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "amazing",
    "awesome",
    "best",
    "clean",
    "comfortable",
    "excellent",
    "friendly",
    "good",
    "great",
    "helpful",
    "nice",
    "polite",
    "professional",
    "punctual",
    "safe",
    "smooth",
];

/// Polarity shift applied per matching keyword set, on the [-1, 1] scale.
pub const KEYWORD_ADJUSTMENT: f32 = 0.7;

/// Apply the keyword rules to a model polarity.
///
/// The negative penalty is applied before the positive bonus; both may apply.
pub fn adjust(text: &str, polarity: f32) -> f32 {
    let mut adjusted = polarity;
    if contains_any(text, NEGATIVE_KEYWORDS) {
        adjusted -= KEYWORD_ADJUSTMENT;
    }
    if contains_any(text, POSITIVE_KEYWORDS) {
        adjusted += KEYWORD_ADJUSTMENT;
    }
    adjusted
}

/// Whether `text` contains any of `keywords` as a whole word.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    words(text).any(|word| keywords.contains(&word.as_str()))
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert!(contains_any("EXCELLENT driver", POSITIVE_KEYWORDS));
        assert!(contains_any("He was Rude.", NEGATIVE_KEYWORDS));
    }

    #[test]
    fn matches_whole_words_only() {
        assert!(!contains_any("unprofessional", POSITIVE_KEYWORDS));
        assert!(contains_any("unprofessional", NEGATIVE_KEYWORDS));
        assert!(!contains_any("goodness me", POSITIVE_KEYWORDS));
    }

    #[test]
    fn punctuation_separates_words() {
        assert!(contains_any("late,rude!", NEGATIVE_KEYWORDS));
        assert!(contains_any("(smooth)", POSITIVE_KEYWORDS));
    }

    #[test]
    fn adjust_applies_each_set_once() {
        assert_eq!(adjust("the ride happened", 0.1), 0.1);
        assert!((adjust("rude and late", 0.0) + 0.7).abs() < 1e-6);
        assert!((adjust("excellent and smooth", 0.0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn adjust_both_sets_cancel() {
        let adjusted = adjust("good driver but late", 0.25);
        assert!((adjusted - 0.25).abs() < 1e-6, "got {adjusted}");
    }

    #[test]
    fn keyword_sets_are_disjoint() {
        for word in NEGATIVE_KEYWORDS {
            assert!(!POSITIVE_KEYWORDS.contains(word), "{word} in both sets");
        }
    }
}
