//! Domain types for weekly content planning
//!
//! Configuration entities (company, channel, identity) are keyed by the
//! string ids they are stored under. Planned posts and replies get fresh
//! UUIDs when they are created.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Enumerations
// ============================================================================

/// Shape of a post, inferred at topic generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Question,
    Story,
    Advice,
}

impl PostKind {
    pub const ALL: [PostKind; 3] = [PostKind::Question, PostKind::Story, PostKind::Advice];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Question => "question",
            PostKind::Story => "story",
            PostKind::Advice => "advice",
        }
    }
}

/// Week-position narrative stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Awareness,
    Authority,
    SubtleMention,
    Value,
    Engagement,
}

impl Strategy {
    /// Stages in narrative order
    pub const SEQUENCE: [Strategy; 5] = [
        Strategy::Awareness,
        Strategy::Authority,
        Strategy::SubtleMention,
        Strategy::Value,
        Strategy::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Awareness => "awareness",
            Strategy::Authority => "authority",
            Strategy::SubtleMention => "subtle_mention",
            Strategy::Value => "value",
            Strategy::Engagement => "engagement",
        }
    }
}

/// Audience size bucket of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelSize {
    Small,
    Medium,
    Large,
}

impl ChannelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelSize::Small => "small",
            ChannelSize::Medium => "medium",
            ChannelSize::Large => "large",
        }
    }
}

/// Purpose of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyIntent {
    Ask,
    Challenge,
    AddValue,
    Clarify,
}

impl ReplyIntent {
    pub const ALL: [ReplyIntent; 4] = [
        ReplyIntent::Ask,
        ReplyIntent::Challenge,
        ReplyIntent::AddValue,
        ReplyIntent::Clarify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyIntent::Ask => "ask",
            ReplyIntent::Challenge => "challenge",
            ReplyIntent::AddValue => "add_value",
            ReplyIntent::Clarify => "clarify",
        }
    }
}

/// Emotional colouring of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Curious,
    Supportive,
    Skeptical,
    Excited,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Curious => "curious",
            Emotion::Supportive => "supportive",
            Emotion::Skeptical => "skeptical",
            Emotion::Excited => "excited",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Severity of an advisory finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Category of an advisory finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Overposting,
    PersonaImbalance,
    TopicRepetition,
    HistoricalRepetition,
    WordingPattern,
    TemporalClustering,
}

/// Error returned when a stored enum label is not recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown label '{}'", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

macro_rules! impl_label_parsing {
    ($ty:ty, [$($variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim().to_lowercase();
                [$($variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or(UnknownLabel(s))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_label_parsing!(PostKind, [PostKind::Question, PostKind::Story, PostKind::Advice]);
impl_label_parsing!(
    Strategy,
    [
        Strategy::Awareness,
        Strategy::Authority,
        Strategy::SubtleMention,
        Strategy::Value,
        Strategy::Engagement,
    ]
);
impl_label_parsing!(ChannelSize, [ChannelSize::Small, ChannelSize::Medium, ChannelSize::Large]);
impl_label_parsing!(
    ReplyIntent,
    [
        ReplyIntent::Ask,
        ReplyIntent::Challenge,
        ReplyIntent::AddValue,
        ReplyIntent::Clarify,
    ]
);
impl_label_parsing!(
    Emotion,
    [
        Emotion::Curious,
        Emotion::Supportive,
        Emotion::Skeptical,
        Emotion::Excited,
        Emotion::Neutral,
    ]
);

// ============================================================================
// Configuration entities (read-only to the engine)
// ============================================================================

/// Client whose week is being planned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target_users: Vec<String>,
    pub pain_points: Vec<String>,
    pub tone: String,
    /// Target search queries, best first
    pub search_queries: Vec<String>,
}

/// Community a post can be placed in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    /// Free-form community rules
    pub rules: String,
    pub min_cooldown_days: u32,
    pub max_posts_per_week: u32,
    pub size: ChannelSize,
}

/// Reusable posting persona
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub tone: String,
    pub expertise: Vec<String>,
    pub account_handle: String,
}

// ============================================================================
// Run state
// ============================================================================

/// Per (channel, company, week) activity counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelActivity {
    pub channel_id: String,
    pub company_id: String,
    pub week_start: NaiveDate,
    pub last_post_date: Option<NaiveDate>,
    pub posts_this_week: u32,
}

/// Previously used topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicHistoryEntry {
    pub company_id: String,
    pub topic: String,
    pub last_used: NaiveDate,
    pub usage_count: u32,
}

/// A post already on record, from this run or earlier weeks
///
/// Rotation, collision and the auditor's history checks only need this
/// much of a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub identity_id: String,
    pub channel_id: String,
    pub topic: String,
    pub date: NaiveDate,
}

/// Topic proposed for one slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicCandidate {
    pub text: String,
    pub kind: PostKind,
    /// Relevance score (0.0-1.0)
    pub relevance: f64,
    pub rationale: String,
}

// ============================================================================
// Plan output
// ============================================================================

/// A scheduled post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPost {
    pub id: Uuid,
    /// Sunday = 0 through Saturday = 6
    pub day_of_week: u8,
    pub scheduled_date: NaiveDate,
    /// Suggested local posting hour (0-23)
    pub scheduled_hour: u8,
    pub order_in_day: u32,
    pub channel_id: String,
    pub topic: String,
    pub identity_id: String,
    pub kind: PostKind,
    pub strategy: Strategy,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PlannedPost {
    pub fn record(&self) -> PostRecord {
        PostRecord {
            identity_id: self.identity_id.clone(),
            channel_id: self.channel_id.clone(),
            topic: self.topic.clone(),
            date: self.scheduled_date,
        }
    }

    /// Title if drafted, otherwise the topic
    pub fn headline(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.topic)
    }
}

/// A reply layered on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedReply {
    pub id: Uuid,
    pub post_id: Uuid,
    pub identity_id: String,
    pub intent: ReplyIntent,
    /// Hours after the parent post (>= 0.5, half-hour steps)
    pub hours_after_post: f64,
    pub tone: String,
    pub emotion: Emotion,
    pub body: String,
}

/// Advisory finding from the spam/safety audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// Composite plan quality
///
/// All sub-scores are 0-10 where higher is better, except `spam_risk`
/// which is the auditor's raw risk (higher is worse) and enters the
/// overall score inverted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: f64,
    pub topic_diversity: f64,
    pub persona_rotation: f64,
    pub channel_distribution: f64,
    pub reply_naturalness: f64,
    pub realism: f64,
    pub channel_fit: f64,
    pub spam_risk: f64,
    pub persona_distinctiveness: f64,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for kind in PostKind::ALL {
            assert_eq!(kind.as_str().parse::<PostKind>().unwrap(), kind);
        }
        for stage in Strategy::SEQUENCE {
            assert_eq!(stage.as_str().parse::<Strategy>().unwrap(), stage);
        }
        for intent in ReplyIntent::ALL {
            assert_eq!(intent.to_string().parse::<ReplyIntent>().unwrap(), intent);
        }
    }

    #[test]
    fn test_label_parsing_is_case_insensitive() {
        assert_eq!(" Story ".parse::<PostKind>().unwrap(), PostKind::Story);
        assert_eq!("LARGE".parse::<ChannelSize>().unwrap(), ChannelSize::Large);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = "rant".parse::<PostKind>().unwrap_err();
        assert_eq!(err, UnknownLabel("rant".to_string()));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Strategy::SubtleMention).unwrap();
        assert_eq!(json, "\"subtle_mention\"");
        let intent: ReplyIntent = serde_json::from_str("\"add_value\"").unwrap();
        assert_eq!(intent, ReplyIntent::AddValue);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }
}
