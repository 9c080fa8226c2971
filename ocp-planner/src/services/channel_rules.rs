//! Channel rule compliance
//!
//! Channel rules are free text. The selector asks a [`RulePredicate`]
//! whether a post kind looks allowed; [`KeywordRules`] answers with
//! substring matching and can be swapped for a real rule engine.

use crate::models::PostKind;

/// Decides whether a channel's rules allow a post kind
pub trait RulePredicate: Send + Sync {
    fn allows(&self, kind: PostKind, rules: &str) -> bool;
}

/// Substring heuristics over lowercased rule text
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordRules;

const QUESTION_BANS: &[&str] = &[
    "no questions",
    "no simple questions",
    "no beginner questions",
    "questions go in the weekly thread",
    "questions belong in the weekly thread",
    "use the weekly question thread",
];

const STORY_BANS: &[&str] = &[
    "no personal stories",
    "no stories",
    "no anecdotes",
    "no personal anecdotes",
    "no blog-style posts",
];

const ADVICE_BANS: &[&str] = &[
    "no advice",
    "no unsolicited advice",
    "no how-to posts",
    "no listicles",
    "no tips posts",
];

impl RulePredicate for KeywordRules {
    fn allows(&self, kind: PostKind, rules: &str) -> bool {
        let rules = rules.to_lowercase();
        let bans = match kind {
            PostKind::Question => QUESTION_BANS,
            PostKind::Story => STORY_BANS,
            PostKind::Advice => ADVICE_BANS,
        };
        !bans.iter().any(|ban| rules.contains(ban))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rules_allow_everything() {
        for kind in PostKind::ALL {
            assert!(KeywordRules.allows(kind, ""));
        }
    }

    #[test]
    fn test_story_ban_only_hits_stories() {
        let rules = "Be kind. No personal stories. No self-promotion.";
        assert!(!KeywordRules.allows(PostKind::Story, rules));
        assert!(KeywordRules.allows(PostKind::Question, rules));
        assert!(KeywordRules.allows(PostKind::Advice, rules));
    }

    #[test]
    fn test_question_thread_rule() {
        let rules = "Simple questions belong in the weekly thread.";
        assert!(!KeywordRules.allows(PostKind::Question, rules));
    }

    #[test]
    fn test_advice_ban_case_insensitive() {
        assert!(!KeywordRules.allows(PostKind::Advice, "NO UNSOLICITED ADVICE"));
    }
}
