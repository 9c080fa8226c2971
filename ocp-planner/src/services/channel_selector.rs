//! Channel Selector
//!
//! Ranks a company's channels for one topic on one target date.
//!
//! # Scoring Algorithm
//! - **Relevance** (weight: 0.40): channel-name keywords found in the
//!   topic, plus a domain-keyword bonus, on top of a 0.3 floor
//! - **Cooldown** (weight: 0.30): 1.0 once the channel's minimum cooldown
//!   has elapsed, otherwise degrading linearly toward 0.3
//! - **Frequency** (weight: 0.20): share of the weekly maximum still
//!   unused, 0.2 once the maximum is reached
//! - **Size fit** (weight: 0.10): small channels favour questions, large
//!   channels favour stories and advice
//!
//! A [`RulePredicate`] that rejects the post kind multiplies the total by
//! 0.3. Selection never comes back empty while channels exist (unless the
//! strict fallback policy filtered them all out).

use crate::config::FallbackPolicy;
use crate::models::{Channel, ChannelActivity, ChannelSize, PostKind, TopicCandidate};
use crate::services::channel_rules::RulePredicate;
use crate::text::{normalize, words};
use chrono::NaiveDate;
use ocp_common::time::{days_between, week_start_for};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const RELEVANCE_WEIGHT: f64 = 0.40;
const COOLDOWN_WEIGHT: f64 = 0.30;
const FREQUENCY_WEIGHT: f64 = 0.20;
const SIZE_FIT_WEIGHT: f64 = 0.10;

const RELEVANCE_FLOOR: f64 = 0.3;
const COOLDOWN_FLOOR: f64 = 0.3;
const FREQUENCY_FLOOR: f64 = 0.2;
const RULE_VIOLATION_MULTIPLIER: f64 = 0.3;

/// Below this every channel counts as a poor fit
const MIN_USEFUL_SCORE: f64 = 0.1;
/// Channels returned when every score is poor
const POOR_FIT_SHORTLIST: usize = 3;

/// Keywords that tie a topic to the business-community space
const DOMAIN_KEYWORDS: &[&str] = &[
    "startup",
    "saas",
    "founder",
    "entrepreneur",
    "marketing",
    "growth",
    "sales",
    "product",
    "business",
    "customer",
    "support",
    "bootstrap",
    "indie",
    "freelance",
];

/// Score breakdown for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelScore {
    pub channel_id: String,
    pub total: f64,
    pub relevance: f64,
    pub cooldown: f64,
    pub frequency: f64,
    pub size_fit: f64,
    pub rule_compliant: bool,
    /// Weekly maximum already used up in the target week
    pub limit_reached: bool,
}

/// In-run channel activity, keyed by channel id
///
/// Mirrors the durable `channel_activity` rows so later slots in the same
/// run see earlier placements.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    by_channel: HashMap<String, ChannelActivity>,
}

impl ActivityTracker {
    pub fn new(activity: impl IntoIterator<Item = ChannelActivity>) -> Self {
        Self {
            by_channel: activity
                .into_iter()
                .map(|a| (a.channel_id.clone(), a))
                .collect(),
        }
    }

    pub fn get(&self, channel_id: &str) -> Option<&ChannelActivity> {
        self.by_channel.get(channel_id)
    }

    /// Count a post placed in `channel_id` on `date`
    pub fn record_post(&mut self, channel_id: &str, company_id: &str, date: NaiveDate) {
        let week = week_start_for(date);
        let entry = self
            .by_channel
            .entry(channel_id.to_string())
            .or_insert_with(|| ChannelActivity {
                channel_id: channel_id.to_string(),
                company_id: company_id.to_string(),
                week_start: week,
                last_post_date: None,
                posts_this_week: 0,
            });

        if entry.week_start != week {
            entry.week_start = week;
            entry.posts_this_week = 0;
        }
        entry.posts_this_week += 1;
        entry.last_post_date = Some(entry.last_post_date.map_or(date, |d| d.max(date)));
    }
}

/// Channel Selector
pub struct ChannelSelector {
    rules: Arc<dyn RulePredicate>,
    policy: FallbackPolicy,
}

impl ChannelSelector {
    pub fn new(rules: Arc<dyn RulePredicate>, policy: FallbackPolicy) -> Self {
        Self { rules, policy }
    }

    /// Rank channels for a topic, best first
    ///
    /// With at least one channel the result is non-empty under
    /// `BestAvailable`. If every score is below 0.1 only the top three are
    /// returned.
    pub fn rank(
        &self,
        channels: &[Channel],
        activity: &ActivityTracker,
        topic: &TopicCandidate,
        target_date: NaiveDate,
    ) -> Vec<ChannelScore> {
        let mut scored: Vec<ChannelScore> = channels
            .iter()
            .map(|c| self.score_channel(c, activity.get(&c.id), topic, target_date))
            .filter(|s| self.policy == FallbackPolicy::BestAvailable || Self::within_limits(s))
            .collect();

        scored.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

        if !scored.is_empty() && scored.iter().all(|s| s.total < MIN_USEFUL_SCORE) {
            debug!(topic = %topic.text, "Every channel scored below {}, keeping shortlist", MIN_USEFUL_SCORE);
            scored.truncate(POOR_FIT_SHORTLIST);
        }

        scored
    }

    fn within_limits(score: &ChannelScore) -> bool {
        score.cooldown >= 1.0 && !score.limit_reached
    }

    /// Full score breakdown for one channel
    pub fn score_channel(
        &self,
        channel: &Channel,
        activity: Option<&ChannelActivity>,
        topic: &TopicCandidate,
        target_date: NaiveDate,
    ) -> ChannelScore {
        let relevance = relevance_score(&channel.name, &topic.text);
        let cooldown = cooldown_score(channel, activity, target_date);
        let frequency = frequency_score(channel, activity, target_date);
        let size_fit = size_fit_score(channel.size, topic.kind);
        let limit_reached = weekly_limit_reached(channel, activity, target_date);

        let mut total = relevance * RELEVANCE_WEIGHT
            + cooldown * COOLDOWN_WEIGHT
            + frequency * FREQUENCY_WEIGHT
            + size_fit * SIZE_FIT_WEIGHT;

        let rule_compliant = self.rules.allows(topic.kind, &channel.rules);
        if !rule_compliant {
            total *= RULE_VIOLATION_MULTIPLIER;
        }

        debug!(
            channel = %channel.name,
            total,
            relevance,
            cooldown,
            frequency,
            size_fit,
            rule_compliant,
            limit_reached,
            "Channel scored"
        );

        ChannelScore {
            channel_id: channel.id.clone(),
            total,
            relevance,
            cooldown,
            frequency,
            size_fit,
            rule_compliant,
            limit_reached,
        }
    }
}

/// Keywords derived from a channel name ("r/SaaSMarketing" -> saas, marketing)
pub fn channel_keywords(name: &str) -> Vec<String> {
    let cleaned = name.trim().trim_start_matches("r/").trim_start_matches("/r/");
    let mut keywords: Vec<String> = words(cleaned)
        .into_iter()
        .filter(|w| w.len() >= 3)
        .collect();

    let squashed = normalize(cleaned).replace(' ', "");
    for domain in DOMAIN_KEYWORDS {
        if squashed.contains(domain) && !keywords.iter().any(|k| k == domain) {
            keywords.push(domain.to_string());
        }
    }
    keywords
}

fn word_matches(keyword: &str, word: &str) -> bool {
    keyword == word
        || (keyword.len() >= 4 && word.starts_with(keyword))
        || (word.len() >= 4 && keyword.starts_with(word))
}

/// Lexical relevance of a channel to a topic (0.3-1.0)
pub fn relevance_score(channel_name: &str, topic: &str) -> f64 {
    let keywords = channel_keywords(channel_name);
    let topic_words = words(topic);

    let overlap = if keywords.is_empty() {
        0.0
    } else {
        let hits = keywords
            .iter()
            .filter(|k| topic_words.iter().any(|w| word_matches(k, w)))
            .count();
        hits as f64 / keywords.len() as f64
    };

    let topic_norm = normalize(topic);
    let bonus = DOMAIN_KEYWORDS
        .iter()
        .filter(|d| topic_norm.contains(*d))
        .map(|d| if keywords.iter().any(|k| k == d) { 0.2 } else { 0.1 })
        .fold(0.0, f64::max);

    (RELEVANCE_FLOOR + 0.5 * overlap + bonus).min(1.0)
}

/// 1.0 once cooldown has elapsed, otherwise linear toward 0.3
pub fn cooldown_score(
    channel: &Channel,
    activity: Option<&ChannelActivity>,
    target_date: NaiveDate,
) -> f64 {
    let Some(last) = activity.and_then(|a| a.last_post_date) else {
        return 1.0;
    };
    let cooldown = channel.min_cooldown_days as i64;
    if cooldown == 0 {
        return 1.0;
    }

    let since = days_between(last, target_date).max(0);
    if since >= cooldown {
        return 1.0;
    }

    let remaining = (cooldown - since) as f64;
    (1.0 - (1.0 - COOLDOWN_FLOOR) * remaining / cooldown as f64).max(COOLDOWN_FLOOR)
}

/// Unused share of the weekly maximum, 0.2 once it is reached
pub fn frequency_score(
    channel: &Channel,
    activity: Option<&ChannelActivity>,
    target_date: NaiveDate,
) -> f64 {
    let Some(activity) = activity else {
        return 1.0;
    };
    if activity.posts_this_week == 0 || activity.week_start != week_start_for(target_date) {
        return 1.0;
    }

    let max = channel.max_posts_per_week;
    if activity.posts_this_week >= max {
        return FREQUENCY_FLOOR;
    }
    ((max - activity.posts_this_week) as f64 / max as f64).max(FREQUENCY_FLOOR)
}

/// Whether the channel has no posts left this week
///
/// Activity tracked for another week says nothing about the target week.
pub fn weekly_limit_reached(channel: &Channel, activity: Option<&ChannelActivity>, target_date: NaiveDate) -> bool {
    activity.is_some_and(|a| {
        a.week_start == week_start_for(target_date) && a.posts_this_week >= channel.max_posts_per_week
    })
}

/// How well a post kind suits a channel's audience size
pub fn size_fit_score(size: ChannelSize, kind: PostKind) -> f64 {
    match (size, kind) {
        (ChannelSize::Small, PostKind::Question) => 1.0,
        (ChannelSize::Small, _) => 0.5,
        (ChannelSize::Large, PostKind::Question) => 0.5,
        (ChannelSize::Large, _) => 1.0,
        (ChannelSize::Medium, _) => 0.75,
    }
}
