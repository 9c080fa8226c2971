//! Lexical helpers shared by the scorers
//!
//! Stand-ins for semantic similarity: normalisation, word sets with a
//! small verb-synonym table, Jaccard overlap and whole-word term matching.

use std::collections::HashSet;

/// Phrases that mark a topic as promotional
pub const PROMOTIONAL_KEYWORDS: &[&str] = &[
    "buy",
    "sign up",
    "signup",
    "free trial",
    "discount",
    "coupon",
    "promo code",
    "limited time offer",
    "click here",
    "check out our",
    "our product",
    "our pricing",
];

/// Interchangeable verbs folded to one form before overlap is measured
const SYNONYMS: &[(&str, &str)] = &[
    ("handle", "manage"),
    ("handling", "managing"),
    ("deal", "manage"),
    ("dealing", "managing"),
    ("tackle", "manage"),
    ("tackling", "managing"),
    ("grow", "scale"),
    ("growing", "scaling"),
    ("fix", "solve"),
    ("fixing", "solving"),
    ("pick", "choose"),
    ("picking", "choosing"),
    ("customers", "customer"),
    ("clients", "customer"),
    ("client", "customer"),
];

/// Lowercase, replace punctuation with spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalised words in order
pub fn words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn canonical(word: &str) -> &str {
    SYNONYMS
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| *to)
        .unwrap_or(word)
}

/// Word set with synonyms folded, for similarity checks
pub fn word_set(text: &str) -> HashSet<String> {
    words(text)
        .iter()
        .map(|w| canonical(w).to_string())
        .collect()
}

/// Jaccard similarity of two word sets (0.0-1.0)
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Word-set Jaccard similarity of two texts
pub fn text_similarity(a: &str, b: &str) -> f64 {
    jaccard(&word_set(a), &word_set(b))
}

/// Character-level near-duplicate check on normalised text
///
/// Catches rewordings that differ by a typo or plural, which share too few
/// exact words for the Jaccard check.
pub fn near_duplicate(a: &str, b: &str, threshold: f64) -> bool {
    strsim::normalized_levenshtein(&normalize(a), &normalize(b)) >= threshold
}

/// Whether `term` occurs in `text` as whole words
///
/// "buy" matches "where to buy it" but not "buyer personas".
pub fn contains_term(text: &str, term: &str) -> bool {
    let haystack = words(text);
    let needle = words(term);
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

/// Endings accepted on the last word of a promotional phrase
const INFLECTIONS: &[&str] = &["", "s", "es", "er", "ers", "ing", "ed"];

fn is_inflection_of(word: &str, stem: &str) -> bool {
    word.strip_prefix(stem)
        .is_some_and(|rest| INFLECTIONS.contains(&rest))
}

/// Like [`contains_term`], but the phrase's last word may carry a common
/// ending ("buy" matches "buying" and "buyers", not "buyout")
pub fn contains_inflected(text: &str, term: &str) -> bool {
    let haystack = words(text);
    let needle = words(term);
    let Some((last, head)) = needle.split_last() else {
        return false;
    };
    if needle.len() > haystack.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|w| w[..head.len()] == *head && is_inflection_of(&w[head.len()], last))
}

/// Case-insensitive substring match
pub fn contains_literal(text: &str, literal: &str) -> bool {
    let literal = literal.trim();
    !literal.is_empty() && text.to_lowercase().contains(&literal.to_lowercase())
}

/// Promotional keywords present in `text`
pub fn promotional_hits(text: &str) -> Vec<&'static str> {
    PROMOTIONAL_KEYWORDS
        .iter()
        .copied()
        .filter(|k| contains_inflected(text, k))
        .collect()
}

/// Mean of a slice (0.0 when empty)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population variance of a slice (0.0 when empty)
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_near_duplicate_catches_small_edits() {
        assert!(near_duplicate(
            "How do you onboard new hires?",
            "How do you onboard new hire?",
            0.9
        ));
        assert!(!near_duplicate(
            "How are you dealing with content planning right now?",
            "How are you dealing with team alignment right now?",
            0.9
        ));
    }

    #[test]
    fn test_normalize_strips_punctuation_and_case() {
        assert_eq!(normalize("  How do YOU handle   scaling support?! "), "how do you handle scaling support");
        assert_eq!(normalize("SaaS/B2B - pricing"), "saas b2b pricing");
    }

    #[test]
    fn test_near_duplicate_support_question_is_similar() {
        let sim = text_similarity(
            "How do you handle scaling support?",
            "How do you manage scaling customer support?",
        );
        assert!(sim >= 0.7, "similarity was {}", sim);
    }

    #[test]
    fn test_unrelated_topics_are_dissimilar() {
        let sim = text_similarity(
            "How do you handle scaling support?",
            "What was your first hire as a solo founder?",
        );
        assert!(sim < 0.3, "similarity was {}", sim);
    }

    #[test]
    fn test_jaccard_of_empty_sets_is_zero() {
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_contains_term_respects_word_boundaries() {
        assert!(contains_term("Where can I buy this?", "buy"));
        assert!(!contains_term("Building buyer personas", "buy"));
        assert!(contains_term("Is the Free Trial worth it", "free trial"));
        assert!(!contains_term("free time trial", "free trial"));
    }

    #[test]
    fn test_promotional_hits() {
        assert_eq!(promotional_hits("Sign up today for a free trial"), vec!["sign up", "free trial"]);
        assert!(promotional_hits("How do you plan your week?").is_empty());
    }

    #[test]
    fn test_promotional_hits_cover_inflections() {
        assert_eq!(promotional_hits("Buying a help desk this year"), vec!["buy"]);
        assert_eq!(promotional_hits("What buyers ask before they commit"), vec!["buy"]);
        assert_eq!(promotional_hits("Stacking discounts with coupons"), vec!["discount", "coupon"]);
        assert_eq!(promotional_hits("A look at our products"), vec!["our product"]);
        assert!(promotional_hits("Lessons from a management buyout").is_empty());
        assert!(promotional_hits("Our production pipeline").is_empty());
    }

    #[test]
    fn test_variance() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[2.0, 2.0, 2.0]), 0.0);
        assert!((variance(&[1.0, 3.0]) - 1.0).abs() < 1e-9);
    }
}
