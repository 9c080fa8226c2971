//! Identity Assigner
//!
//! Picks the persona that writes a post.
//!
//! # Scoring Algorithm
//! - **Expertise** (weight: 0.40): share of expertise tags found in the
//!   topic, directly or through [`EXPERTISE_SYNONYMS`]
//! - **Tone** (weight: 0.30): 1.0 when the tone suits the post kind, else 0.6
//! - **Rotation** (weight: 0.20): fewer posts in the trailing 7 days score higher
//! - **Collision** (weight: 0.10): 0 when the identity posted in the same
//!   channel within the trailing 3 days
//!
//! Colliding identities leave the candidate pool. When all of them collide
//! the best overall score still wins under `BestAvailable`.

use crate::config::FallbackPolicy;
use crate::models::{Identity, PostKind, PostRecord, TopicCandidate};
use crate::text::contains_term;
use chrono::NaiveDate;
use ocp_common::time::days_between;
use std::cmp::Ordering;
use tracing::{debug, warn};

const EXPERTISE_WEIGHT: f64 = 0.40;
const TONE_WEIGHT: f64 = 0.30;
const ROTATION_WEIGHT: f64 = 0.20;
const COLLISION_WEIGHT: f64 = 0.10;

const ROTATION_WINDOW_DAYS: i64 = 7;
const COLLISION_WINDOW_DAYS: i64 = 3;

/// Expertise tag -> related words that also count as a match
const EXPERTISE_SYNONYMS: &[(&str, &[&str])] = &[
    ("marketing", &["growth", "conversion", "seo", "acquisition", "brand", "content"]),
    ("engineering", &["code", "developer", "infrastructure", "scaling", "technical", "bug"]),
    ("sales", &["pipeline", "deal", "outreach", "prospect", "closing", "pricing"]),
    ("product", &["roadmap", "feature", "feedback", "users", "prioritizing", "launch"]),
    ("support", &["customer", "ticket", "onboarding", "churn", "help desk"]),
    ("finance", &["budget", "cash", "runway", "revenue", "pricing", "costs"]),
    ("operations", &["process", "workflow", "planning", "team", "hiring"]),
    ("founder", &["startup", "fundraising", "cofounder", "bootstrapping", "early stage"]),
];

const QUESTION_TONES: &[&str] = &["curious", "casual", "friendly", "inquisitive"];
const STORY_TONES: &[&str] = &["casual", "friendly", "storyteller", "enthusiastic", "candid"];
const ADVICE_TONES: &[&str] = &["expert", "professional", "helpful", "analytical", "authoritative"];

/// Score breakdown for one identity
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityScore {
    pub identity_id: String,
    pub total: f64,
    pub expertise: f64,
    pub tone: f64,
    pub rotation: f64,
    pub collision: f64,
}

/// Identity Assigner
pub struct IdentityAssigner {
    policy: FallbackPolicy,
}

impl IdentityAssigner {
    pub fn new(policy: FallbackPolicy) -> Self {
        Self { policy }
    }

    /// Every identity scored, best first
    pub fn rank(
        &self,
        identities: &[Identity],
        topic: &TopicCandidate,
        channel_id: &str,
        target_date: NaiveDate,
        history: &[PostRecord],
    ) -> Vec<IdentityScore> {
        let mut scored: Vec<IdentityScore> = identities
            .iter()
            .map(|identity| score_identity(identity, topic, channel_id, target_date, history))
            .collect();
        scored.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
        scored
    }

    /// Winning identity for a slot
    ///
    /// None only when there are no identities, or under `Strict` when every
    /// identity collides.
    pub fn assign(
        &self,
        identities: &[Identity],
        topic: &TopicCandidate,
        channel_id: &str,
        target_date: NaiveDate,
        history: &[PostRecord],
    ) -> Option<IdentityScore> {
        let ranked = self.rank(identities, topic, channel_id, target_date, history);

        if let Some(best) = ranked.iter().find(|s| s.collision > 0.0) {
            debug!(
                identity = %best.identity_id,
                total = best.total,
                channel = channel_id,
                "Identity assigned"
            );
            return Some(best.clone());
        }

        match self.policy {
            FallbackPolicy::BestAvailable => {
                let best = ranked.into_iter().next()?;
                warn!(
                    identity = %best.identity_id,
                    channel = channel_id,
                    "Every identity collides, using best available"
                );
                Some(best)
            }
            FallbackPolicy::Strict => {
                warn!(channel = channel_id, "Every identity collides, no identity assigned");
                None
            }
        }
    }
}

/// Full score breakdown for one identity
pub fn score_identity(
    identity: &Identity,
    topic: &TopicCandidate,
    channel_id: &str,
    target_date: NaiveDate,
    history: &[PostRecord],
) -> IdentityScore {
    let expertise = expertise_score(&identity.expertise, &topic.text);
    let tone = tone_score(&identity.tone, topic.kind);
    let rotation = rotation_score(&identity.id, history, target_date);
    let collision = collision_score(&identity.id, channel_id, history, target_date);

    IdentityScore {
        identity_id: identity.id.clone(),
        total: expertise * EXPERTISE_WEIGHT
            + tone * TONE_WEIGHT
            + rotation * ROTATION_WEIGHT
            + collision * COLLISION_WEIGHT,
        expertise,
        tone,
        rotation,
        collision,
    }
}

fn tag_matches(tag: &str, topic: &str) -> bool {
    if contains_term(topic, tag) {
        return true;
    }
    let tag = tag.trim().to_lowercase();
    EXPERTISE_SYNONYMS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, related)| related.iter().any(|r| contains_term(topic, r)))
        .unwrap_or(false)
}

/// Share of expertise tags matched in the topic; 0.5 without tags
pub fn expertise_score(expertise: &[String], topic: &str) -> f64 {
    let tags: Vec<&String> = expertise.iter().filter(|t| !t.trim().is_empty()).collect();
    if tags.is_empty() {
        return 0.5;
    }
    let hits = tags.iter().filter(|t| tag_matches(t, topic)).count();
    (hits as f64 / tags.len() as f64).min(1.0)
}

/// 1.0 when the tone suits the post kind, else 0.6
pub fn tone_score(tone: &str, kind: PostKind) -> f64 {
    let preferred = match kind {
        PostKind::Question => QUESTION_TONES,
        PostKind::Story => STORY_TONES,
        PostKind::Advice => ADVICE_TONES,
    };
    let tone = tone.trim().to_lowercase();
    if preferred.contains(&tone.as_str()) {
        1.0
    } else {
        0.6
    }
}

fn days_before(post: &PostRecord, target_date: NaiveDate) -> i64 {
    days_between(post.date, target_date)
}

/// Load spreading over the trailing week
pub fn rotation_score(identity_id: &str, history: &[PostRecord], target_date: NaiveDate) -> f64 {
    let recent = history
        .iter()
        .filter(|p| p.identity_id == identity_id)
        .filter(|p| (0..ROTATION_WINDOW_DAYS).contains(&days_before(p, target_date)))
        .count();
    match recent {
        0 => 1.0,
        1 => 0.8,
        2 => 0.5,
        _ => 0.2,
    }
}

/// 0 when the identity posted in this channel within the trailing 3 days
pub fn collision_score(
    identity_id: &str,
    channel_id: &str,
    history: &[PostRecord],
    target_date: NaiveDate,
) -> f64 {
    let collides = history.iter().any(|p| {
        p.identity_id == identity_id
            && p.channel_id == channel_id
            && (0..COLLISION_WINDOW_DAYS).contains(&days_before(p, target_date))
    });
    if collides {
        0.0
    } else {
        1.0
    }
}
