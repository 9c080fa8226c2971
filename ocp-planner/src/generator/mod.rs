//! Text-generation collaborator
//!
//! The planner drafts topic ideas, post bodies and reply text through the
//! `TextGenerator` trait. Every caller recovers from a failed call with the
//! deterministic content in [`fallback`], so an unavailable collaborator
//! degrades output quality but never aborts a run.
//!
//! # Implementations
//! - [`HttpTextGenerator`] - chat-completions style HTTP endpoint
//! - [`DisabledGenerator`] - always unavailable, forces fallback content

pub mod fallback;
pub mod http_client;

pub use http_client::HttpTextGenerator;

use crate::error::GeneratorError;
use crate::models::{Emotion, PostKind, ReplyIntent, Strategy};
use serde::{Deserialize, Serialize};

/// Topic generation request
#[derive(Debug, Clone, Serialize)]
pub struct TopicRequest {
    pub company_name: String,
    pub company_description: String,
    pub target_users: Vec<String>,
    pub pain_points: Vec<String>,
    pub tone: String,
    /// Search queries, best first
    pub target_queries: Vec<String>,
    /// Recently used topics the collaborator should avoid
    pub exclude_topics: Vec<String>,
    pub count: usize,
}

/// Raw topic idea returned by the collaborator
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawTopic {
    pub topic: String,
    pub kind: PostKind,
    #[serde(default)]
    pub rationale: String,
}

/// Persona description passed to drafting calls
#[derive(Debug, Clone, Serialize)]
pub struct PersonaBrief {
    pub name: String,
    pub tone: String,
    pub expertise: Vec<String>,
}

/// Post drafting request
#[derive(Debug, Clone, Serialize)]
pub struct PostDraftRequest {
    pub topic: String,
    pub kind: PostKind,
    pub strategy: Strategy,
    pub channel_name: String,
    pub persona: PersonaBrief,
}

/// Drafted post content
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub body: String,
}

/// Reply drafting request
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRequest {
    pub post_title: String,
    pub post_body: String,
    pub post_kind: PostKind,
    pub persona: PersonaBrief,
    pub intent: ReplyIntent,
    pub tone: String,
    pub emotion: Emotion,
}

/// Text-generation collaborator
///
/// Implementations may fail freely; callers own the fallback.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Collaborator name for log output
    fn name(&self) -> &'static str;

    /// Propose `request.count` topic ideas
    async fn generate_topics(&self, request: &TopicRequest) -> Result<Vec<RawTopic>, GeneratorError>;

    /// Draft a post title and body
    async fn draft_post(&self, request: &PostDraftRequest) -> Result<PostDraft, GeneratorError>;

    /// Draft a short (2-4 sentence) reply
    async fn draft_reply(&self, request: &ReplyRequest) -> Result<String, GeneratorError>;
}

/// Generator used when no endpoint is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait::async_trait]
impl TextGenerator for DisabledGenerator {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn generate_topics(&self, _request: &TopicRequest) -> Result<Vec<RawTopic>, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }

    async fn draft_post(&self, _request: &PostDraftRequest) -> Result<PostDraft, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }

    async fn draft_reply(&self, _request: &ReplyRequest) -> Result<String, GeneratorError> {
        Err(GeneratorError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_generator_always_unavailable() {
        let generator = DisabledGenerator;
        let request = TopicRequest {
            company_name: "Acme".to_string(),
            company_description: String::new(),
            target_users: vec![],
            pain_points: vec![],
            tone: "helpful".to_string(),
            target_queries: vec![],
            exclude_topics: vec![],
            count: 3,
        };

        let result = generator.generate_topics(&request).await;
        assert!(matches!(result, Err(GeneratorError::Unavailable)));
        assert_eq!(generator.name(), "disabled");
    }

    #[test]
    fn test_raw_topic_rationale_optional() {
        let topic: RawTopic = serde_json::from_str(r#"{"topic": "Hiring first engineer", "kind": "story"}"#).unwrap();
        assert_eq!(topic.kind, PostKind::Story);
        assert!(topic.rationale.is_empty());
    }
}
