//! Spam/Safety Auditor
//!
//! Read-only pass over a finished week that reports advisory
//! [`SpamWarning`]s and an aggregate risk score (0-10). Never mutates the
//! plan and never blocks its creation.
//!
//! # Penalties
//! - Overposting: +2 (medium), +3 when the weekly max is exceeded by 50% or more (high)
//! - Persona imbalance: +2
//! - Repeated topic this week: +1 for two uses, +2 for three or more
//! - Topic matching a recent historical post: +0.5 each
//! - Repeated 3-word phrase: +1 each (at most 5 reported)
//! - Same-channel posts under 2 days apart: +2 each
//!
//! A plan passes when risk < 5 and nothing is high severity.

use crate::models::{Channel, Identity, PlannedPost, PostRecord, Severity, SpamWarning, WarningKind};
use crate::text::{normalize, words};
use ocp_common::time::days_between;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::info;

const MAX_RISK: f64 = 10.0;
const PASS_THRESHOLD: f64 = 5.0;
const IMBALANCE_SHARE: f64 = 0.4;
const MAX_WORDING_WARNINGS: usize = 5;
const MIN_PHRASE_WORD_LEN: usize = 5;
const CLUSTER_DAYS: i64 = 2;

/// Auditor output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub warnings: Vec<SpamWarning>,
    /// Aggregate risk (0-10, higher is worse)
    pub risk_score: f64,
    pub passed: bool,
}

impl AuditReport {
    pub fn has_high_severity(&self) -> bool {
        self.warnings.iter().any(|w| w.severity == Severity::High)
    }

    /// Warnings of one kind
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &SpamWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// Spam/Safety Auditor
pub struct SpamAuditor {
    /// Most recent historical posts compared for topic repetition
    historical_window: usize,
}

impl Default for SpamAuditor {
    fn default() -> Self {
        Self {
            historical_window: 20,
        }
    }
}

struct Findings {
    warnings: Vec<SpamWarning>,
    risk: f64,
}

impl Findings {
    fn push(&mut self, kind: WarningKind, severity: Severity, penalty: f64, message: String, recommendation: &str) {
        self.warnings.push(SpamWarning {
            kind,
            severity,
            message,
            recommendation: recommendation.to_string(),
        });
        self.risk += penalty;
    }
}

impl SpamAuditor {
    pub fn new(historical_window: usize) -> Self {
        Self { historical_window }
    }

    /// Audit one week's posts
    ///
    /// `history` holds posts from prior weeks (any order).
    pub fn audit(
        &self,
        posts: &[PlannedPost],
        channels: &[Channel],
        identities: &[Identity],
        history: &[PostRecord],
    ) -> AuditReport {
        let mut findings = Findings {
            warnings: Vec::new(),
            risk: 0.0,
        };

        // Step 1: Overposting per channel
        self.check_overposting(posts, channels, &mut findings);

        // Step 2: Persona imbalance
        self.check_imbalance(posts, identities, &mut findings);

        // Step 3: Repeated topics this week and against history
        self.check_topic_repetition(posts, &mut findings);
        self.check_historical_repetition(posts, history, &mut findings);

        // Step 4: Repeated wording across headlines
        self.check_wording(posts, &mut findings);

        // Step 5: Temporal clustering within a channel
        self.check_clustering(posts, channels, &mut findings);

        let mut report = AuditReport {
            warnings: findings.warnings,
            risk_score: findings.risk.min(MAX_RISK),
            passed: false,
        };
        report.passed = report.risk_score < PASS_THRESHOLD && !report.has_high_severity();

        info!(
            "Spam audit: posts={}, warnings={}, risk={:.1}, passed={}",
            posts.len(),
            report.warnings.len(),
            report.risk_score,
            report.passed
        );

        report
    }

    fn check_overposting(&self, posts: &[PlannedPost], channels: &[Channel], findings: &mut Findings) {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for post in posts {
            *counts.entry(post.channel_id.as_str()).or_insert(0) += 1;
        }

        for channel in channels {
            let count = counts.get(channel.id.as_str()).copied().unwrap_or(0);
            let max = channel.max_posts_per_week;
            if count <= max {
                continue;
            }

            let severe = count as f64 >= max as f64 * 1.5;
            let (severity, penalty) = if severe {
                (Severity::High, 3.0)
            } else {
                (Severity::Medium, 2.0)
            };
            findings.push(
                WarningKind::Overposting,
                severity,
                penalty,
                format!("{} has {} posts this week (max {})", channel.name, count, max),
                "Move some posts to other channels or later weeks",
            );
        }
    }

    fn check_imbalance(&self, posts: &[PlannedPost], identities: &[Identity], findings: &mut Findings) {
        if identities.len() < 2 || posts.is_empty() {
            return;
        }

        let mut counts: HashMap<&str, usize> = identities.iter().map(|i| (i.id.as_str(), 0)).collect();
        for post in posts {
            *counts.entry(post.identity_id.as_str()).or_insert(0) += 1;
        }

        let most = counts.values().copied().max().unwrap_or(0);
        let least = counts.values().copied().min().unwrap_or(0);
        let spread = (most - least) as f64;

        if spread > IMBALANCE_SHARE * posts.len() as f64 {
            findings.push(
                WarningKind::PersonaImbalance,
                Severity::Medium,
                2.0,
                format!(
                    "Identity usage is uneven: most-used has {} posts, least-used has {}",
                    most, least
                ),
                "Spread posts more evenly across identities",
            );
        }
    }

    fn check_topic_repetition(&self, posts: &[PlannedPost], findings: &mut Findings) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for post in posts {
            *counts.entry(normalize(&post.topic)).or_insert(0) += 1;
        }

        for (topic, count) in counts.into_iter().filter(|(_, c)| *c > 1) {
            let (severity, penalty) = if count >= 3 {
                (Severity::High, 2.0)
            } else {
                (Severity::Medium, 1.0)
            };
            findings.push(
                WarningKind::TopicRepetition,
                severity,
                penalty,
                format!("Topic \"{}\" appears {} times this week", topic, count),
                "Replace repeated topics with fresh angles",
            );
        }
    }

    fn check_historical_repetition(&self, posts: &[PlannedPost], history: &[PostRecord], findings: &mut Findings) {
        let mut recent: Vec<&PostRecord> = history.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        let past: HashSet<String> = recent
            .into_iter()
            .take(self.historical_window)
            .map(|p| normalize(&p.topic))
            .collect();

        for post in posts {
            if past.contains(&normalize(&post.topic)) {
                findings.push(
                    WarningKind::HistoricalRepetition,
                    Severity::Low,
                    0.5,
                    format!("Topic \"{}\" was used in a recent week", post.topic),
                    "Rephrase or swap the topic",
                );
            }
        }
    }

    fn check_wording(&self, posts: &[PlannedPost], findings: &mut Findings) {
        let mut phrase_counts: BTreeMap<String, usize> = BTreeMap::new();

        for post in posts {
            let long_words: Vec<String> = words(post.headline())
                .into_iter()
                .filter(|w| w.chars().count() >= MIN_PHRASE_WORD_LEN)
                .collect();
            let phrases: HashSet<String> = long_words.windows(3).map(|w| w.join(" ")).collect();
            for phrase in phrases {
                *phrase_counts.entry(phrase).or_insert(0) += 1;
            }
        }

        for (phrase, count) in phrase_counts
            .into_iter()
            .filter(|(_, c)| *c > 1)
            .take(MAX_WORDING_WARNINGS)
        {
            findings.push(
                WarningKind::WordingPattern,
                Severity::Low,
                1.0,
                format!("Phrase \"{}\" repeats across {} posts", phrase, count),
                "Vary the wording of titles",
            );
        }
    }

    fn check_clustering(&self, posts: &[PlannedPost], channels: &[Channel], findings: &mut Findings) {
        for channel in channels.iter().filter(|c| c.min_cooldown_days > 1) {
            let mut dates: Vec<_> = posts
                .iter()
                .filter(|p| p.channel_id == channel.id)
                .map(|p| p.scheduled_date)
                .collect();
            dates.sort();

            for pair in dates.windows(2) {
                let gap = days_between(pair[0], pair[1]);
                if gap < CLUSTER_DAYS {
                    findings.push(
                        WarningKind::TemporalClustering,
                        Severity::Medium,
                        2.0,
                        format!(
                            "{} has posts {} day(s) apart on {} and {}",
                            channel.name, gap, pair[0], pair[1]
                        ),
                        "Space posts in this channel further apart",
                    );
                }
            }
        }
    }
}
