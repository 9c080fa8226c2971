//! Quality Scorer
//!
//! Composite 0-10 score over a finished week. A pure function of its
//! inputs: scoring the same plan twice gives the same result.
//!
//! # Sub-scores (0-10)
//! - Topic diversity: unique-topic ratio x 10
//! - Persona rotation: 10 - 5 x variance-to-mean ratio of per-identity
//!   counts, minus 1 per back-to-back same-identity pair
//! - Channel distribution: penalises a busiest channel above 1.5x the mean
//! - Reply naturalness: reply rate near 50-80% (5), timing spread (3),
//!   intent variety (2), minus 5 per self-reply
//! - Realism: post-kind variety (3), reply text present (2), timing
//!   spread (2), strategy variety (3)
//! - Channel fit: 10 minus the auditor's overposting and clustering findings
//! - Spam risk: the auditor's risk, inverted in the overall score
//! - Persona distinctiveness: low overlap between identities' post kinds

use crate::models::{
    Channel, Identity, PlannedPost, PlannedReply, QualityScore, Severity, WarningKind,
};
use crate::text::{jaccard, mean, normalize, variance};
use crate::validators::spam_auditor::AuditReport;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

const MAX_SCORE: f64 = 10.0;

/// Weights of the overall score
#[derive(Debug, Clone)]
pub struct ScoreWeights {
    pub topic_diversity: f64,
    pub persona_rotation: f64,
    pub channel_distribution: f64,
    pub reply_naturalness: f64,
    pub realism: f64,
    pub channel_fit: f64,
    pub inverted_risk: f64,
    pub persona_distinctiveness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            topic_diversity: 0.15,
            persona_rotation: 0.15,
            channel_distribution: 0.15,
            reply_naturalness: 0.15,
            realism: 0.15,
            channel_fit: 0.10,
            inverted_risk: 0.10,
            persona_distinctiveness: 0.05,
        }
    }
}

/// Quality Scorer
#[derive(Default)]
pub struct QualityScorer {
    weights: ScoreWeights,
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, MAX_SCORE)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Standard deviation of reply delays in hours
fn timing_spread(replies: &[PlannedReply]) -> f64 {
    let hours: Vec<f64> = replies.iter().map(|r| r.hours_after_post).collect();
    variance(&hours).sqrt()
}

impl QualityScorer {
    /// Score a finished week
    pub fn score(
        &self,
        posts: &[PlannedPost],
        replies: &[PlannedReply],
        identities: &[Identity],
        channels: &[Channel],
        audit: &AuditReport,
    ) -> QualityScore {
        let mut issues = Vec::new();

        let topic_diversity = self.topic_diversity(posts, &mut issues);
        let persona_rotation = self.persona_rotation(posts, identities, &mut issues);
        let channel_distribution = self.channel_distribution(posts, channels, &mut issues);
        let reply_naturalness = self.reply_naturalness(posts, replies, &mut issues);
        let realism = self.realism(posts, replies, &mut issues);
        let channel_fit = self.channel_fit(audit, &mut issues);
        let spam_risk = audit.risk_score.clamp(0.0, MAX_SCORE);
        let persona_distinctiveness = self.persona_distinctiveness(posts, &mut issues);

        if spam_risk >= 5.0 {
            issues.push(format!("Spam risk is high ({:.1}/10)", spam_risk));
        }

        let w = &self.weights;
        let overall = topic_diversity * w.topic_diversity
            + persona_rotation * w.persona_rotation
            + channel_distribution * w.channel_distribution
            + reply_naturalness * w.reply_naturalness
            + realism * w.realism
            + channel_fit * w.channel_fit
            + (MAX_SCORE - spam_risk) * w.inverted_risk
            + persona_distinctiveness * w.persona_distinctiveness;
        let overall = round2(clamp_score(overall));

        debug!(
            overall,
            topic_diversity,
            persona_rotation,
            channel_distribution,
            reply_naturalness,
            realism,
            channel_fit,
            spam_risk,
            persona_distinctiveness,
            "Plan scored"
        );

        QualityScore {
            overall,
            topic_diversity: round2(topic_diversity),
            persona_rotation: round2(persona_rotation),
            channel_distribution: round2(channel_distribution),
            reply_naturalness: round2(reply_naturalness),
            realism: round2(realism),
            channel_fit: round2(channel_fit),
            spam_risk: round2(spam_risk),
            persona_distinctiveness: round2(persona_distinctiveness),
            issues,
        }
    }

    fn topic_diversity(&self, posts: &[PlannedPost], issues: &mut Vec<String>) -> f64 {
        if posts.is_empty() {
            issues.push("No posts to score".to_string());
            return 0.0;
        }
        let unique: HashSet<String> = posts.iter().map(|p| normalize(&p.topic)).collect();
        let ratio = unique.len() as f64 / posts.len() as f64;
        if unique.len() < posts.len() {
            issues.push(format!(
                "{} of {} topics are repeats",
                posts.len() - unique.len(),
                posts.len()
            ));
        }
        clamp_score(ratio * MAX_SCORE)
    }

    fn persona_rotation(&self, posts: &[PlannedPost], identities: &[Identity], issues: &mut Vec<String>) -> f64 {
        if posts.is_empty() {
            return 0.0;
        }

        let mut counts: BTreeMap<&str, f64> = identities.iter().map(|i| (i.id.as_str(), 0.0)).collect();
        for post in posts {
            *counts.entry(post.identity_id.as_str()).or_insert(0.0) += 1.0;
        }
        let values: Vec<f64> = counts.values().copied().collect();
        let m = mean(&values);
        let vmr = if m > 0.0 { variance(&values) / m } else { 0.0 };

        let mut ordered: Vec<&PlannedPost> = posts.iter().collect();
        ordered.sort_by_key(|p| (p.day_of_week, p.order_in_day));
        let back_to_back = ordered
            .windows(2)
            .filter(|w| w[0].identity_id == w[1].identity_id)
            .count();

        if vmr > 1.0 {
            issues.push(format!("Identity load is uneven (variance/mean {:.2})", vmr));
        }
        if back_to_back > 0 {
            issues.push(format!("{} back-to-back posts by the same identity", back_to_back));
        }

        clamp_score(MAX_SCORE - vmr * 5.0 - back_to_back as f64)
    }

    fn channel_distribution(&self, posts: &[PlannedPost], channels: &[Channel], issues: &mut Vec<String>) -> f64 {
        if posts.is_empty() {
            return 0.0;
        }

        let mut counts: BTreeMap<&str, f64> = channels.iter().map(|c| (c.id.as_str(), 0.0)).collect();
        for post in posts {
            *counts.entry(post.channel_id.as_str()).or_insert(0.0) += 1.0;
        }
        let values: Vec<f64> = counts.values().copied().collect();
        let m = mean(&values);
        let busiest = values.iter().copied().fold(0.0, f64::max);
        let ratio = if m > 0.0 { busiest / m } else { 0.0 };

        if ratio > 1.5 {
            issues.push(format!(
                "Posts concentrate in one channel ({:.1}x the mean)",
                ratio
            ));
            clamp_score(MAX_SCORE - (ratio - 1.5) * 5.0)
        } else {
            MAX_SCORE
        }
    }

    fn reply_naturalness(&self, posts: &[PlannedPost], replies: &[PlannedReply], issues: &mut Vec<String>) -> f64 {
        if posts.is_empty() {
            return 0.0;
        }

        let authors: HashMap<_, &str> = posts.iter().map(|p| (p.id, p.identity_id.as_str())).collect();
        let replied: HashSet<_> = replies.iter().map(|r| r.post_id).collect();
        let rate = replied.len() as f64 / posts.len() as f64;

        let rate_points = if (0.5..=0.8).contains(&rate) {
            5.0
        } else {
            let distance = if rate < 0.5 { 0.5 - rate } else { rate - 0.8 };
            issues.push(format!("Reply rate {:.0}% is outside 50-80%", rate * 100.0));
            (5.0 - distance * 10.0).max(0.0)
        };

        let spread = timing_spread(replies);
        let timing_points = if replies.len() < 2 { 0.0 } else { (spread / 2.0).min(1.0) * 3.0 };

        let intents: HashSet<_> = replies.iter().map(|r| r.intent).collect();
        let intent_points = intents.len() as f64 / 4.0 * 2.0;

        let self_replies = replies
            .iter()
            .filter(|r| authors.get(&r.post_id) == Some(&r.identity_id.as_str()))
            .count();
        if self_replies > 0 {
            issues.push(format!("{} self-replies found", self_replies));
        }

        clamp_score(rate_points + timing_points + intent_points - 5.0 * self_replies as f64)
    }

    fn realism(&self, posts: &[PlannedPost], replies: &[PlannedReply], issues: &mut Vec<String>) -> f64 {
        if posts.is_empty() {
            return 0.0;
        }

        let kinds: HashSet<_> = posts.iter().map(|p| p.kind).collect();
        let kind_points = kinds.len() as f64 / 3.0 * 3.0;
        if kinds.len() == 1 && posts.len() > 1 {
            issues.push("Every post has the same kind".to_string());
        }

        let body_points = if replies.is_empty() {
            0.0
        } else {
            let with_text = replies.iter().filter(|r| !r.body.trim().is_empty()).count();
            with_text as f64 / replies.len() as f64 * 2.0
        };

        let timing_points = if replies.len() < 2 {
            0.0
        } else {
            (timing_spread(replies) / 2.0).min(1.0) * 2.0
        };

        let strategies: HashSet<_> = posts.iter().map(|p| p.strategy).collect();
        let strategy_points = strategies.len() as f64 / posts.len().min(5) as f64 * 3.0;

        clamp_score(kind_points + body_points + timing_points + strategy_points)
    }

    fn channel_fit(&self, audit: &AuditReport, issues: &mut Vec<String>) -> f64 {
        let penalty: f64 = audit
            .warnings
            .iter()
            .filter(|w| matches!(w.kind, WarningKind::Overposting | WarningKind::TemporalClustering))
            .map(|w| match w.severity {
                Severity::High => 4.0,
                Severity::Medium => 2.5,
                Severity::Low => 1.0,
            })
            .sum();
        if penalty > 0.0 {
            issues.push("Channel limits or spacing were not respected".to_string());
        }
        clamp_score(MAX_SCORE - penalty)
    }

    fn persona_distinctiveness(&self, posts: &[PlannedPost], issues: &mut Vec<String>) -> f64 {
        let mut kinds_by_identity: BTreeMap<&str, HashSet<String>> = BTreeMap::new();
        for post in posts {
            kinds_by_identity
                .entry(post.identity_id.as_str())
                .or_default()
                .insert(post.kind.as_str().to_string());
        }
        if kinds_by_identity.len() < 2 {
            return 5.0;
        }

        let sets: Vec<&HashSet<String>> = kinds_by_identity.values().collect();
        let mut overlaps = Vec::new();
        for i in 0..sets.len() {
            for j in (i + 1)..sets.len() {
                overlaps.push(jaccard(sets[i], sets[j]));
            }
        }
        let overlap = mean(&overlaps);
        if overlap > 0.8 {
            issues.push("Identities post nearly the same kinds of content".to_string());
        }
        clamp_score(MAX_SCORE * (1.0 - 0.6 * overlap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelSize, Emotion, PostKind, ReplyIntent, SpamWarning, Strategy};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            name: id.to_string(),
            tone: "helpful".to_string(),
            expertise: vec![],
            account_handle: String::new(),
        }
    }

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: id.to_string(),
            rules: String::new(),
            min_cooldown_days: 3,
            max_posts_per_week: 3,
            size: ChannelSize::Medium,
        }
    }

    fn post(day: u8, channel: &str, identity: &str, topic: &str, kind: PostKind, strategy: Strategy) -> PlannedPost {
        PlannedPost {
            id: Uuid::new_v4(),
            day_of_week: day,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 6, 2 + day as u32).unwrap(),
            scheduled_hour: 9,
            order_in_day: 0,
            channel_id: channel.to_string(),
            topic: topic.to_string(),
            identity_id: identity.to_string(),
            kind,
            strategy,
            title: None,
            body: None,
        }
    }

    fn reply(post: &PlannedPost, identity: &str, intent: ReplyIntent, hours: f64) -> PlannedReply {
        PlannedReply {
            id: Uuid::new_v4(),
            post_id: post.id,
            identity_id: identity.to_string(),
            intent,
            hours_after_post: hours,
            tone: "helpful".to_string(),
            emotion: Emotion::Neutral,
            body: "Good point.".to_string(),
        }
    }

    fn clean_audit() -> AuditReport {
        AuditReport {
            warnings: vec![],
            risk_score: 0.0,
            passed: true,
        }
    }

    fn week() -> Vec<PlannedPost> {
        vec![
            post(1, "a", "x", "Pricing a first product", PostKind::Question, Strategy::Awareness),
            post(2, "b", "y", "Hiring the first engineer", PostKind::Story, Strategy::Authority),
            post(3, "a", "x", "Churn after onboarding", PostKind::Advice, Strategy::SubtleMention),
            post(5, "b", "y", "Cold outreach that works", PostKind::Question, Strategy::Value),
            post(6, "a", "x", "Weekly planning rituals", PostKind::Story, Strategy::Engagement),
        ]
    }

    #[test]
    fn test_scores_in_range_and_deterministic() {
        let posts = week();
        let replies = vec![
            reply(&posts[0], "y", ReplyIntent::AddValue, 4.0),
            reply(&posts[1], "x", ReplyIntent::Ask, 1.5),
            reply(&posts[3], "x", ReplyIntent::Challenge, 12.0),
        ];
        let identities = vec![identity("x"), identity("y")];
        let channels = vec![channel("a"), channel("b")];
        let scorer = QualityScorer::default();

        let first = scorer.score(&posts, &replies, &identities, &channels, &clean_audit());
        let second = scorer.score(&posts, &replies, &identities, &channels, &clean_audit());

        assert_eq!(first, second);
        assert!((0.0..=10.0).contains(&first.overall));
        assert_eq!(first.topic_diversity, 10.0);
        assert_eq!(first.channel_distribution, 10.0);
        assert_eq!(first.spam_risk, 0.0);
    }

    #[test]
    fn test_repeated_topics_lower_diversity() {
        let mut posts = week();
        posts[4].topic = "pricing a first product!".to_string();
        let score = QualityScorer::default().score(&posts, &[], &[], &[], &clean_audit());
        assert_eq!(score.topic_diversity, 8.0);
        assert!(score.issues.iter().any(|i| i.contains("repeats")));
    }

    #[test]
    fn test_self_reply_is_penalised() {
        let posts = week();
        let good = vec![
            reply(&posts[0], "y", ReplyIntent::AddValue, 4.0),
            reply(&posts[1], "x", ReplyIntent::Ask, 1.5),
            reply(&posts[2], "y", ReplyIntent::Clarify, 2.0),
        ];
        let mut bad = good.clone();
        bad[0].identity_id = "x".to_string();

        let scorer = QualityScorer::default();
        let good_score = scorer.score(&posts, &good, &[], &[], &clean_audit());
        let bad_score = scorer.score(&posts, &bad, &[], &[], &clean_audit());

        assert!(bad_score.reply_naturalness + 4.9 < good_score.reply_naturalness);
        assert!(bad_score.issues.iter().any(|i| i.contains("self-replies")));
    }

    #[test]
    fn test_back_to_back_identity_penalised() {
        let posts = vec![
            post(1, "a", "x", "one", PostKind::Question, Strategy::Awareness),
            post(2, "b", "x", "two", PostKind::Story, Strategy::Value),
            post(3, "a", "y", "three", PostKind::Advice, Strategy::Engagement),
        ];
        let identities = vec![identity("x"), identity("y")];
        let score = QualityScorer::default().score(&posts, &[], &identities, &[], &clean_audit());
        // counts [2, 1]: mean 1.5, variance 0.25, vmr 1/6
        let expected = 10.0 - (0.25 / 1.5) * 5.0 - 1.0;
        assert!((score.persona_rotation - round2(expected)).abs() < 1e-9);
    }

    #[test]
    fn test_channel_fit_and_risk_follow_audit() {
        let posts = week();
        let audit = AuditReport {
            warnings: vec![SpamWarning {
                kind: WarningKind::Overposting,
                severity: Severity::High,
                message: String::new(),
                recommendation: String::new(),
            }],
            risk_score: 3.0,
            passed: false,
        };
        let score = QualityScorer::default().score(&posts, &[], &[], &[], &audit);
        assert_eq!(score.channel_fit, 6.0);
        assert_eq!(score.spam_risk, 3.0);
    }

    #[test]
    fn test_distinctiveness_defaults_for_single_identity() {
        let posts = vec![post(1, "a", "x", "one", PostKind::Question, Strategy::Awareness)];
        let score = QualityScorer::default().score(&posts, &[], &[], &[], &clean_audit());
        assert_eq!(score.persona_distinctiveness, 5.0);
    }

    #[test]
    fn test_empty_plan_scores_low_but_valid() {
        let score = QualityScorer::default().score(&[], &[], &[], &[], &clean_audit());
        assert!((0.0..=10.0).contains(&score.overall));
        assert_eq!(score.topic_diversity, 0.0);
    }
}
