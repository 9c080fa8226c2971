//! HTTP text-generation client
//!
//! Talks to a chat-completions style endpoint (`POST {base_url}/chat/completions`).
//! Requests are serialised through a client-side rate limiter. Topic and
//! post drafting ask the model for JSON and parse it out of the reply;
//! reply drafting takes the text as-is.

use super::{PostDraft, PostDraftRequest, RawTopic, ReplyRequest, TextGenerator, TopicRequest};
use crate::error::GeneratorError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const USER_AGENT: &str = concat!("ocp-planner/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`HttpTextGenerator`]
#[derive(Debug, Clone)]
pub struct HttpGeneratorSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub min_interval: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TopicEnvelope {
    topics: Vec<RawTopic>,
}

/// Rate limiter enforcing a minimum interval between requests
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Chat-completions text generator
pub struct HttpTextGenerator {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(settings: HttpGeneratorSettings) -> Result<Self, GeneratorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GeneratorError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(settings.min_interval)),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model,
            api_key: settings.api_key,
        })
    }

    /// Send one system + user exchange and return the assistant text
    async fn complete(&self, system: &str, user: String) -> Result<String, GeneratorError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.8,
        };

        tracing::debug!(url = %url, model = %self.model, "Calling text generation endpoint");

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeneratorError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeneratorError::ApiError(status.as_u16(), error_text));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GeneratorError::EmptyResponse);
        }

        Ok(content)
    }
}

/// Pull the first JSON value out of model output that may wrap it in prose
/// or a fenced code block
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find(|c: char| c == '{' || c == '[')?;
    let open = content[start..].chars().next()?;
    let close = if open == '{' { '}' } else { ']' };
    let end = content.rfind(close)?;
    (end > start).then(|| &content[start..=end])
}

fn parse_topics(content: &str) -> Result<Vec<RawTopic>, GeneratorError> {
    let json = extract_json(content)
        .ok_or_else(|| GeneratorError::ParseError("no JSON in topic response".to_string()))?;

    // Accept either a bare array or {"topics": [...]}
    let topics = match serde_json::from_str::<Vec<RawTopic>>(json) {
        Ok(topics) => topics,
        Err(_) => serde_json::from_str::<TopicEnvelope>(json)
            .map(|e| e.topics)
            .map_err(|e| GeneratorError::ParseError(e.to_string()))?,
    };

    if topics.is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    Ok(topics)
}

fn parse_post_draft(content: &str) -> Result<PostDraft, GeneratorError> {
    let json = extract_json(content)
        .ok_or_else(|| GeneratorError::ParseError("no JSON in post response".to_string()))?;
    let draft: PostDraft =
        serde_json::from_str(json).map_err(|e| GeneratorError::ParseError(e.to_string()))?;
    if draft.title.trim().is_empty() || draft.body.trim().is_empty() {
        return Err(GeneratorError::EmptyResponse);
    }
    Ok(draft)
}

#[async_trait::async_trait]
impl TextGenerator for HttpTextGenerator {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn generate_topics(&self, request: &TopicRequest) -> Result<Vec<RawTopic>, GeneratorError> {
        let system = "You plan organic community discussions. Respond only with a JSON array of \
                      objects: {\"topic\": string, \"kind\": \"question\"|\"story\"|\"advice\", \
                      \"rationale\": string}. Never promote a product.";
        let user = format!(
            "Company: {}\nDescription: {}\nTarget users: {}\nPain points: {}\nTone: {}\n\
             Search queries (best first): {}\nAvoid these recent topics: {}\n\
             Propose {} discussion topics.",
            request.company_name,
            request.company_description,
            request.target_users.join(", "),
            request.pain_points.join(", "),
            request.tone,
            request.target_queries.join("; "),
            request.exclude_topics.join("; "),
            request.count,
        );

        let content = self.complete(system, user).await?;
        let topics = parse_topics(&content)?;

        tracing::info!(requested = request.count, received = topics.len(), "Received topic ideas");
        Ok(topics)
    }

    async fn draft_post(&self, request: &PostDraftRequest) -> Result<PostDraft, GeneratorError> {
        let system = "You write authentic community posts. Respond only with JSON: \
                      {\"title\": string, \"body\": string}. No links, no product names.";
        let user = format!(
            "Community: {}\nPost type: {}\nNarrative stage: {}\nTopic: {}\n\
             Write as {} ({} tone, experience in {}).",
            request.channel_name,
            request.kind,
            request.strategy,
            request.topic,
            request.persona.name,
            request.persona.tone,
            request.persona.expertise.join(", "),
        );

        let content = self.complete(system, user).await?;
        parse_post_draft(&content)
    }

    async fn draft_reply(&self, request: &ReplyRequest) -> Result<String, GeneratorError> {
        let system = "You write short, natural community replies of 2-4 sentences. \
                      Plain text only, no greetings, no links.";
        let user = format!(
            "Post ({}): {}\n{}\n\nReply as {} ({}; experience in {}).\n\
             Intent: {}. Tone: {}. Emotion: {}.",
            request.post_kind,
            request.post_title,
            request.post_body,
            request.persona.name,
            request.persona.tone,
            request.persona.expertise.join(", "),
            request.intent,
            request.tone,
            request.emotion,
        );

        self.complete(system, user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostKind;

    fn settings() -> HttpGeneratorSettings {
        HttpGeneratorSettings {
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            model: "test-model".to_string(),
            api_key: None,
            timeout: Duration::from_millis(200),
            min_interval: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = HttpTextGenerator::new(settings()).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9/v1");
        assert_eq!(client.name(), "http");
    }

    #[test]
    fn test_parse_topics_bare_array() {
        let content = r#"[{"topic": "How do you price a niche tool?", "kind": "question", "rationale": "common"}]"#;
        let topics = parse_topics(content).unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].kind, PostKind::Question);
    }

    #[test]
    fn test_parse_topics_fenced_envelope() {
        let content = "Here you go:\n```json\n{\"topics\": [{\"topic\": \"Our first churn spike\", \"kind\": \"story\"}]}\n```";
        let topics = parse_topics(content).unwrap();
        assert_eq!(topics[0].topic, "Our first churn spike");
    }

    #[test]
    fn test_parse_topics_rejects_prose() {
        assert!(matches!(parse_topics("no ideas today"), Err(GeneratorError::ParseError(_))));
        assert!(matches!(parse_topics("[]"), Err(GeneratorError::EmptyResponse)));
    }

    #[test]
    fn test_parse_post_draft_requires_content() {
        let ok = parse_post_draft(r#"{"title": "T", "body": "B"}"#).unwrap();
        assert_eq!(ok.title, "T");
        assert!(parse_post_draft(r#"{"title": "", "body": "B"}"#).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = HttpTextGenerator::new(settings()).unwrap();
        let request = ReplyRequest {
            post_title: "t".to_string(),
            post_body: "b".to_string(),
            post_kind: PostKind::Question,
            persona: crate::generator::PersonaBrief {
                name: "Sam".to_string(),
                tone: "curious".to_string(),
                expertise: vec![],
            },
            intent: crate::models::ReplyIntent::Ask,
            tone: "curious".to_string(),
            emotion: crate::models::Emotion::Curious,
        };

        let result = client.draft_reply(&request).await;
        assert!(matches!(result, Err(GeneratorError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_rate_limiter_spacing() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
