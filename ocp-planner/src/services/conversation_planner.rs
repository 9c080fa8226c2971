//! Conversation Planner
//!
//! Layers replies over the week's posts. Planning is split in two:
//! [`ConversationPlanner::plan`] makes every random choice (which posts,
//! who replies, intent, timing, emotion) and [`ConversationPlanner::draft`]
//! fetches the reply text, falling back to fixed sentences per intent.
//!
//! Invariants enforced by [`ConversationPlanner::validate`]:
//! - a reply never comes from the identity that wrote the post
//! - no identity has more than `max_replies_per_identity` replies per week
//!   (earliest selected replies are kept)

use crate::config::PlannerConfig;
use crate::generator::fallback::fallback_reply;
use crate::generator::{PersonaBrief, ReplyRequest, TextGenerator};
use crate::models::{Emotion, Identity, PlannedPost, PlannedReply, PostKind, ReplyIntent};
use crate::text::contains_term;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Candidates kept for the weighted reply-persona draw
const REPLY_CANDIDATE_POOL: usize = 3;
/// Tone most personas share; a different tone earns a small bonus
const COMMON_TONE: &str = "helpful";
const MIN_HOURS: f64 = 0.5;

/// A reply with every decision made but no text yet
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPlan {
    pub post_id: Uuid,
    pub identity_id: String,
    pub intent: ReplyIntent,
    pub hours_after_post: f64,
    pub tone: String,
    pub emotion: Emotion,
}

/// Intent weights by post kind
pub fn intent_weights(kind: PostKind) -> &'static [(ReplyIntent, f64)] {
    use ReplyIntent::*;
    match kind {
        PostKind::Question => &[(AddValue, 0.5), (Clarify, 0.3), (Ask, 0.2)],
        PostKind::Story => &[(Ask, 0.4), (AddValue, 0.3), (Challenge, 0.2), (Clarify, 0.1)],
        PostKind::Advice => &[(Challenge, 0.3), (Clarify, 0.3), (AddValue, 0.2), (Ask, 0.2)],
    }
}

/// Base reply delay range in hours
pub fn hours_range(intent: ReplyIntent) -> (f64, f64) {
    match intent {
        ReplyIntent::Ask => (1.0, 6.0),
        ReplyIntent::Challenge => (8.0, 24.0),
        ReplyIntent::AddValue => (3.0, 12.0),
        ReplyIntent::Clarify => (0.5, 4.0),
    }
}

/// Emotion implied by intent and persona tone
pub fn emotion_for(intent: ReplyIntent, tone: &str) -> Emotion {
    let tone = tone.trim().to_lowercase();
    match intent {
        ReplyIntent::Ask => Emotion::Curious,
        ReplyIntent::Challenge => Emotion::Skeptical,
        ReplyIntent::AddValue if tone == "enthusiastic" || tone == "casual" => Emotion::Excited,
        ReplyIntent::AddValue => Emotion::Supportive,
        ReplyIntent::Clarify if tone == "curious" => Emotion::Curious,
        ReplyIntent::Clarify => Emotion::Neutral,
    }
}

/// Nearest half hour, never below 0.5
pub fn round_to_half_hour(hours: f64) -> f64 {
    ((hours * 2.0).round() / 2.0).max(MIN_HOURS)
}

fn reply_affinity(identity: &Identity, topic: &str) -> f64 {
    let expertise_hits = identity
        .expertise
        .iter()
        .filter(|tag| contains_term(topic, tag))
        .count() as f64;
    let variety = if identity.tone.trim().eq_ignore_ascii_case(COMMON_TONE) {
        0.0
    } else {
        0.1
    };
    0.5 + 0.3 * expertise_hits + variety
}

fn persona_brief(identity: &Identity) -> PersonaBrief {
    PersonaBrief {
        name: identity.name.clone(),
        tone: identity.tone.clone(),
        expertise: identity.expertise.clone(),
    }
}

/// Conversation Planner
pub struct ConversationPlanner {
    reply_rate: f64,
    max_replies_per_identity: usize,
    skeptical_override_chance: f64,
}

impl ConversationPlanner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            reply_rate: config.reply_rate.clamp(0.0, 1.0),
            max_replies_per_identity: config.max_replies_per_identity,
            skeptical_override_chance: config.skeptical_override_chance.clamp(0.0, 1.0),
        }
    }

    /// Decide which posts get a reply and shape each reply
    ///
    /// Posts keep their input order in the result.
    pub fn plan(
        &self,
        posts: &[PlannedPost],
        identities: &[Identity],
        rng: &mut impl Rng,
    ) -> Vec<ReplyPlan> {
        let wanted = ((posts.len() as f64) * self.reply_rate).round() as usize;
        let wanted = wanted.min(posts.len());
        if wanted == 0 || identities.len() < 2 {
            debug!(posts = posts.len(), identities = identities.len(), "No replies planned");
            return Vec::new();
        }

        let mut chosen = index::sample(rng, posts.len(), wanted).into_vec();
        chosen.sort_unstable();

        let mut reply_counts: HashMap<&str, usize> = HashMap::new();
        let mut plans = Vec::with_capacity(chosen.len());

        for i in chosen {
            let post = &posts[i];
            let Some(identity) = self.pick_replier(post, identities, &reply_counts, rng) else {
                continue;
            };
            *reply_counts.entry(identity.id.as_str()).or_insert(0) += 1;

            let intent = pick_intent(post.kind, rng);
            let (min, max) = hours_range(intent);
            let jitter = rng.gen_range(0.7..=1.3);
            let hours_after_post = round_to_half_hour(rng.gen_range(min..=max) * jitter);

            let mut emotion = emotion_for(intent, &identity.tone);
            if intent != ReplyIntent::Challenge && rng.gen_bool(self.skeptical_override_chance) {
                emotion = Emotion::Skeptical;
            }

            plans.push(ReplyPlan {
                post_id: post.id,
                identity_id: identity.id.clone(),
                intent,
                hours_after_post,
                tone: identity.tone.clone(),
                emotion,
            });
        }

        info!(posts = posts.len(), replies = plans.len(), "Conversation planned");
        plans
    }

    fn pick_replier<'a>(
        &self,
        post: &PlannedPost,
        identities: &'a [Identity],
        reply_counts: &HashMap<&str, usize>,
        rng: &mut impl Rng,
    ) -> Option<&'a Identity> {
        let mut scored: Vec<(&Identity, f64)> = identities
            .iter()
            .filter(|i| i.id != post.identity_id)
            .filter(|i| {
                reply_counts.get(i.id.as_str()).copied().unwrap_or(0) < self.max_replies_per_identity
            })
            .map(|i| (i, reply_affinity(i, &post.topic)))
            .collect();
        if scored.is_empty() {
            debug!(post_id = %post.id, "Every other identity is at its reply cap");
            return None;
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(REPLY_CANDIDATE_POOL);

        match WeightedIndex::new(scored.iter().map(|(_, w)| *w)) {
            Ok(dist) => Some(scored[dist.sample(rng)].0),
            Err(_) => scored.first().map(|(i, _)| *i),
        }
    }

    /// Draft reply text for each plan, in order
    ///
    /// Collaborator failures or empty drafts fall back to a fixed sentence.
    pub async fn draft(
        &self,
        generator: &dyn TextGenerator,
        plans: &[ReplyPlan],
        posts: &[PlannedPost],
        identities: &[Identity],
    ) -> Vec<PlannedReply> {
        let mut replies = Vec::with_capacity(plans.len());

        for plan in plans {
            let Some(post) = posts.iter().find(|p| p.id == plan.post_id) else {
                warn!(post_id = %plan.post_id, "Reply plan references an unknown post, skipping");
                continue;
            };
            let Some(identity) = identities.iter().find(|i| i.id == plan.identity_id) else {
                warn!(identity = %plan.identity_id, "Reply plan references an unknown identity, skipping");
                continue;
            };

            let request = ReplyRequest {
                post_title: post.headline().to_string(),
                post_body: post.body.clone().unwrap_or_default(),
                post_kind: post.kind,
                persona: persona_brief(identity),
                intent: plan.intent,
                tone: plan.tone.clone(),
                emotion: plan.emotion,
            };

            let body = match generator.draft_reply(&request).await {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                Ok(_) => {
                    warn!(generator = generator.name(), "Empty reply draft, using fallback text");
                    fallback_reply(plan.intent)
                }
                Err(e) => {
                    warn!(generator = generator.name(), error = %e, "Reply drafting failed, using fallback text");
                    fallback_reply(plan.intent)
                }
            };

            replies.push(PlannedReply {
                id: Uuid::new_v4(),
                post_id: plan.post_id,
                identity_id: plan.identity_id.clone(),
                intent: plan.intent,
                hours_after_post: plan.hours_after_post,
                tone: plan.tone.clone(),
                emotion: plan.emotion,
                body,
            });
        }

        replies
    }

    /// Drop self-replies and replies past the per-identity cap
    pub fn validate(&self, replies: Vec<PlannedReply>, posts: &[PlannedPost]) -> Vec<PlannedReply> {
        let authors: HashMap<Uuid, &str> = posts
            .iter()
            .map(|p| (p.id, p.identity_id.as_str()))
            .collect();
        let mut counts: HashMap<String, usize> = HashMap::new();
        let before = replies.len();

        let kept: Vec<PlannedReply> = replies
            .into_iter()
            .filter(|r| {
                if authors.get(&r.post_id) == Some(&r.identity_id.as_str()) {
                    warn!(identity = %r.identity_id, "Dropping self-reply");
                    return false;
                }
                let count = counts.entry(r.identity_id.clone()).or_insert(0);
                if *count >= self.max_replies_per_identity {
                    debug!(identity = %r.identity_id, "Reply cap reached, dropping reply");
                    return false;
                }
                *count += 1;
                true
            })
            .collect();

        if kept.len() != before {
            info!(dropped = before - kept.len(), "Replies removed by validation");
        }
        kept
    }

    /// Plan, draft and validate in one pass
    pub async fn build(
        &self,
        generator: &dyn TextGenerator,
        posts: &[PlannedPost],
        identities: &[Identity],
        rng: &mut impl Rng,
    ) -> Vec<PlannedReply> {
        let plans = self.plan(posts, identities, rng);
        let drafted = self.draft(generator, &plans, posts, identities).await;
        self.validate(drafted, posts)
    }
}

fn pick_intent(kind: PostKind, rng: &mut impl Rng) -> ReplyIntent {
    let table = intent_weights(kind);
    match WeightedIndex::new(table.iter().map(|(_, w)| *w)) {
        Ok(dist) => table[dist.sample(rng)].0,
        Err(_) => table[0].0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::DisabledGenerator;
    use crate::models::Strategy;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity(id: &str, tone: &str, expertise: &[&str]) -> Identity {
        Identity {
            id: id.to_string(),
            name: id.to_string(),
            tone: tone.to_string(),
            expertise: expertise.iter().map(|s| s.to_string()).collect(),
            account_handle: format!("u/{}", id),
        }
    }

    fn posts(authors: &[&str]) -> Vec<PlannedPost> {
        authors
            .iter()
            .enumerate()
            .map(|(i, author)| PlannedPost {
                id: Uuid::new_v4(),
                day_of_week: (i % 7) as u8,
                scheduled_date: NaiveDate::from_ymd_opt(2024, 6, 2 + (i % 7) as u32).unwrap(),
                scheduled_hour: 9,
                order_in_day: 0,
                channel_id: "c1".to_string(),
                topic: format!("Marketing lesson number {}", i),
                identity_id: author.to_string(),
                kind: PostKind::ALL[i % 3],
                strategy: Strategy::Value,
                title: None,
                body: None,
            })
            .collect()
    }

    fn planner() -> ConversationPlanner {
        ConversationPlanner::new(&PlannerConfig::default())
    }

    #[test]
    fn test_emotion_mapping() {
        assert_eq!(emotion_for(ReplyIntent::Ask, "expert"), Emotion::Curious);
        assert_eq!(emotion_for(ReplyIntent::Challenge, "friendly"), Emotion::Skeptical);
        assert_eq!(emotion_for(ReplyIntent::AddValue, "Enthusiastic"), Emotion::Excited);
        assert_eq!(emotion_for(ReplyIntent::AddValue, "helpful"), Emotion::Supportive);
        assert_eq!(emotion_for(ReplyIntent::Clarify, "curious"), Emotion::Curious);
        assert_eq!(emotion_for(ReplyIntent::Clarify, "expert"), Emotion::Neutral);
    }

    #[test]
    fn test_round_to_half_hour() {
        assert_eq!(round_to_half_hour(0.1), 0.5);
        assert_eq!(round_to_half_hour(3.74), 3.5);
        assert_eq!(round_to_half_hour(3.76), 4.0);
    }

    #[test]
    fn test_intent_tables_sum_to_one() {
        for kind in PostKind::ALL {
            let total: f64 = intent_weights(kind).iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reply_count_follows_rate() {
        let identities = vec![identity("a", "helpful", &[]), identity("b", "curious", &[])];
        let week = posts(&["a", "b", "a", "b", "a"]);
        let mut rng = StdRng::seed_from_u64(7);

        let plans = planner().plan(&week, &identities, &mut rng);
        // round(5 * 0.65) = 3, and no cap is hit with two repliers
        assert_eq!(plans.len(), 3);
    }

    #[test]
    fn test_plan_never_self_replies_and_respects_cap() {
        let identities = vec![
            identity("a", "helpful", &["marketing"]),
            identity("b", "curious", &[]),
            identity("c", "expert", &["sales"]),
        ];
        let week = posts(&["a", "b", "c", "a", "b", "c", "a", "b", "c", "a", "b", "c"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plans = planner().plan(&week, &identities, &mut rng);
            let mut counts: HashMap<&str, usize> = HashMap::new();

            for plan in &plans {
                let post = week.iter().find(|p| p.id == plan.post_id).unwrap();
                assert_ne!(post.identity_id, plan.identity_id, "seed {}", seed);
                assert!(plan.hours_after_post >= 0.5);
                assert_eq!((plan.hours_after_post * 2.0).fract(), 0.0);
                *counts.entry(plan.identity_id.as_str()).or_insert(0) += 1;
            }
            assert!(counts.values().all(|c| *c <= 3), "seed {} counts {:?}", seed, counts);
        }
    }

    #[test]
    fn test_single_identity_gets_no_replies() {
        let identities = vec![identity("a", "helpful", &[])];
        let week = posts(&["a", "a", "a"]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(planner().plan(&week, &identities, &mut rng).is_empty());
    }

    #[test]
    fn test_same_seed_same_plan() {
        let identities = vec![
            identity("a", "helpful", &[]),
            identity("b", "curious", &[]),
            identity("c", "casual", &[]),
        ];
        let week = posts(&["a", "b", "c", "a", "b", "c"]);

        let first = planner().plan(&week, &identities, &mut StdRng::seed_from_u64(42));
        let second = planner().plan(&week, &identities, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_challenge_timing_range() {
        let identities = vec![identity("a", "helpful", &[]), identity("b", "curious", &[])];
        let week = posts(&["a"; 30]);
        let mut rng = StdRng::seed_from_u64(3);

        let plans = ConversationPlanner::new(&PlannerConfig {
            reply_rate: 1.0,
            max_replies_per_identity: 100,
            ..PlannerConfig::default()
        })
        .plan(&week, &identities, &mut rng);

        for plan in plans.iter().filter(|p| p.intent == ReplyIntent::Challenge) {
            assert!(plan.hours_after_post >= 5.5 && plan.hours_after_post <= 31.0);
            assert_eq!(plan.emotion, Emotion::Skeptical);
        }
    }

    #[tokio::test]
    async fn test_draft_falls_back_per_intent() {
        let identities = vec![identity("a", "helpful", &[]), identity("b", "curious", &[])];
        let week = posts(&["a", "b", "a", "b"]);
        let mut rng = StdRng::seed_from_u64(11);

        let replies = planner()
            .build(&DisabledGenerator, &week, &identities, &mut rng)
            .await;

        assert!(!replies.is_empty());
        for reply in &replies {
            assert_eq!(reply.body, fallback_reply(reply.intent));
        }
    }

    #[test]
    fn test_validate_drops_self_replies_and_excess() {
        let week = posts(&["a", "b", "b", "b", "b"]);
        let reply = |post: &PlannedPost, who: &str| PlannedReply {
            id: Uuid::new_v4(),
            post_id: post.id,
            identity_id: who.to_string(),
            intent: ReplyIntent::Ask,
            hours_after_post: 1.0,
            tone: "helpful".to_string(),
            emotion: Emotion::Curious,
            body: "ok".to_string(),
        };

        let replies = vec![
            reply(&week[0], "a"),
            reply(&week[1], "a"),
            reply(&week[2], "a"),
            reply(&week[3], "a"),
            reply(&week[4], "a"),
        ];
        let kept = planner().validate(replies, &week);

        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|r| r.post_id != week[0].id));
        assert_eq!(kept[0].post_id, week[1].id);
        assert_eq!(kept[2].post_id, week[3].id);
    }
}
