//! Topic Candidate Filter
//!
//! Turns raw collaborator ideas into a deduplicated, non-promotional,
//! relevance-ranked topic list for the week.
//!
//! # Scoring
//! - Base 0.5
//! - +0.2 per company pain point found literally in the topic
//! - +0.1 per target user group found literally in the topic
//! - -0.3 per promotional keyword
//! - Clamped to 0.0-1.0
//!
//! # Filtering
//! 1. Any promotional keyword: dropped
//! 2. Word-set Jaccard >= threshold against a topic used in the trailing
//!    history window: dropped
//! 3. Near-duplicates of an already accepted candidate (same word set or
//!    a small character edit away): dropped
//!
//! The collaborator is asked for twice the needed count. If it fails, or
//! too few ideas survive, deterministic fallback topics fill the gap.
//! Fallback topics pass the same rules, so the result is shorter than
//! requested only when every template combination was used recently.

use crate::config::PlannerConfig;
use crate::generator::fallback::{fallback_topics, fallback_variety};
use crate::generator::{RawTopic, TextGenerator, TopicRequest};
use crate::models::{Company, TopicCandidate, TopicHistoryEntry};
use crate::text::{contains_literal, near_duplicate, normalize, promotional_hits, text_similarity};
use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};

/// Most recent topics passed to the collaborator as exclusions
const MAX_EXCLUDED_TOPICS: usize = 50;

/// Normalised edit-distance similarity treated as the same topic
const NEAR_DUPLICATE_RATIO: f64 = 0.9;

/// Topic Candidate Filter
pub struct TopicFilter {
    similarity_threshold: f64,
    history_days: i64,
}

impl TopicFilter {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            similarity_threshold: config.topic_similarity_threshold,
            history_days: config.topic_history_days,
        }
    }

    /// Produce `count` topic candidates for the week starting at `reference`
    ///
    /// Never fails: collaborator errors fall back to template topics.
    pub async fn select(
        &self,
        generator: &dyn TextGenerator,
        company: &Company,
        history: &[TopicHistoryEntry],
        reference: NaiveDate,
        count: usize,
    ) -> Vec<TopicCandidate> {
        if count == 0 {
            return Vec::new();
        }

        let recent = self.recent_topics(history, reference);
        let request = TopicRequest {
            company_name: company.name.clone(),
            company_description: company.description.clone(),
            target_users: company.target_users.clone(),
            pain_points: company.pain_points.clone(),
            tone: company.tone.clone(),
            target_queries: company.search_queries.clone(),
            exclude_topics: recent.iter().take(MAX_EXCLUDED_TOPICS).cloned().collect(),
            count: count * 2,
        };

        match generator.generate_topics(&request).await {
            Ok(raw) => {
                info!(
                    generator = generator.name(),
                    received = raw.len(),
                    requested = count * 2,
                    "Topic ideas received"
                );
                self.filter(company, raw, &recent, count)
            }
            Err(e) => {
                warn!(
                    generator = generator.name(),
                    error = %e,
                    "Topic generation failed, using fallback topics"
                );
                self.filter(company, fallback_topics(&company.pain_points, count), &recent, count)
            }
        }
    }

    /// Topics used within the history window ending at `reference`, newest first
    ///
    /// Uses on or after `reference` belong to the week being (re)planned and
    /// are ignored.
    pub fn recent_topics(&self, history: &[TopicHistoryEntry], reference: NaiveDate) -> Vec<String> {
        let cutoff = reference - Duration::days(self.history_days);
        let mut recent: Vec<&TopicHistoryEntry> = history
            .iter()
            .filter(|h| h.last_used >= cutoff && h.last_used < reference)
            .collect();
        recent.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        recent.into_iter().map(|h| h.topic.clone()).collect()
    }

    /// Score, filter and rank raw ideas, topping up with fallback topics
    pub fn filter(
        &self,
        company: &Company,
        raw: Vec<RawTopic>,
        recent: &[String],
        count: usize,
    ) -> Vec<TopicCandidate> {
        let mut accepted: Vec<TopicCandidate> = Vec::new();

        for topic in raw {
            if let Some(candidate) = self.admit(company, topic, recent, &accepted) {
                accepted.push(candidate);
            }
        }

        // Highest relevance first; ties keep collaborator order
        accepted.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        accepted.truncate(count);

        if accepted.len() < count {
            let shortfall = count - accepted.len();
            warn!(shortfall, "Too few topic ideas survived filtering, adding fallback topics");
            self.top_up(company, recent, &mut accepted, count);
        }

        accepted
    }

    /// Relevance score for a topic (0.0-1.0)
    pub fn score(&self, company: &Company, text: &str) -> f64 {
        let pain_hits = company
            .pain_points
            .iter()
            .filter(|p| contains_literal(text, p))
            .count() as f64;
        let user_hits = company
            .target_users
            .iter()
            .filter(|u| contains_literal(text, u))
            .count() as f64;
        let promo_hits = promotional_hits(text).len() as f64;

        (0.5 + 0.2 * pain_hits + 0.1 * user_hits - 0.3 * promo_hits).clamp(0.0, 1.0)
    }

    fn to_candidate(&self, company: &Company, raw: RawTopic) -> TopicCandidate {
        let relevance = self.score(company, &raw.topic);
        TopicCandidate {
            text: raw.topic.trim().to_string(),
            kind: raw.kind,
            relevance,
            rationale: raw.rationale,
        }
    }

    /// Apply the drop rules to one idea
    fn admit(
        &self,
        company: &Company,
        raw: RawTopic,
        recent: &[String],
        accepted: &[TopicCandidate],
    ) -> Option<TopicCandidate> {
        if raw.topic.trim().is_empty() {
            return None;
        }

        let promo = promotional_hits(&raw.topic);
        if !promo.is_empty() {
            debug!(topic = %raw.topic, keywords = ?promo, "Dropping promotional topic");
            return None;
        }

        if let Some(previous) = recent
            .iter()
            .find(|r| text_similarity(&raw.topic, r) >= self.similarity_threshold)
        {
            debug!(topic = %raw.topic, previous = %previous, "Dropping topic similar to recent history");
            return None;
        }

        let normalized = normalize(&raw.topic);
        let duplicate = accepted.iter().any(|a| {
            normalize(&a.text) == normalized
                || text_similarity(&a.text, &raw.topic) >= self.similarity_threshold
                || near_duplicate(&a.text, &raw.topic, NEAR_DUPLICATE_RATIO)
        });
        if duplicate {
            debug!(topic = %raw.topic, "Dropping near-duplicate topic");
            return None;
        }

        Some(self.to_candidate(company, raw))
    }

    fn top_up(
        &self,
        company: &Company,
        recent: &[String],
        accepted: &mut Vec<TopicCandidate>,
        count: usize,
    ) {
        // Every distinct combination, so templates used recently can be skipped
        let size = (count * 3 + 3).max(fallback_variety(&company.pain_points));

        for raw in fallback_topics(&company.pain_points, size) {
            if accepted.len() >= count {
                return;
            }
            if let Some(candidate) = self.admit(company, raw, recent, accepted) {
                accepted.push(candidate);
            }
        }

        if accepted.len() < count {
            warn!(
                available = accepted.len(),
                requested = count,
                "Fallback topics exhausted by recent history, planning fewer topics"
            );
        }
    }
}
