//! Weekly calendar generation workflow
//!
//! # Phases
//! 1. Load company, identities, channels, history (configuration errors are fatal)
//! 2. **Posts** (`phase_posts`): topics, slots, stages, then channel and
//!    identity per slot, drafted and persisted one at a time
//! 3. **Replies**: conversation plan over the persisted posts
//! 4. **Scoring** (`phase_scoring`): audit, quality score, calendar update
//!
//! Collaborator failures fall back to template content. A post or reply
//! that fails to persist is logged and skipped; the run fails only when no
//! post was created.

use crate::config::PlannerConfig;
use crate::db;
use crate::db::calendars::CalendarRecord;
use crate::error::{PlannerError, PlannerResult};
use crate::generator::TextGenerator;
use crate::models::{Channel, Company, Identity, PlannedPost, PlannedReply, QualityScore, SpamWarning};
use crate::services::channel_rules::{KeywordRules, RulePredicate};
use crate::services::conversation_planner::ConversationPlanner;
use chrono::NaiveDate;
use ocp_common::time::week_start_for;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

mod phase_posts;
mod phase_scoring;

/// One generation request from the caller
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub company_id: String,
    /// Any date in the target week
    pub week_start: NaiveDate,
    pub post_count: u32,
}

/// Outcome of a generation or rescoring run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub calendar_id: Uuid,
    pub planned_posts: usize,
    pub created_posts: usize,
    pub planned_replies: usize,
    pub created_replies: usize,
    pub quality: QualityScore,
    pub warnings: Vec<SpamWarning>,
    pub risk_score: f64,
    pub audit_passed: bool,
}

/// A stored calendar with its posts and replies
#[derive(Debug, Clone, Serialize)]
pub struct CalendarView {
    pub calendar: CalendarRecord,
    pub posts: Vec<PlannedPost>,
    pub replies: Vec<PlannedReply>,
}

/// Configuration loaded for one company
pub(crate) struct CompanyContext {
    pub company: Company,
    pub identities: Vec<Identity>,
    pub channels: Vec<Channel>,
}

/// Calendar generation service
pub struct CalendarGenerator {
    db: SqlitePool,
    generator: Arc<dyn TextGenerator>,
    rules: Arc<dyn RulePredicate>,
    config: PlannerConfig,
}

impl CalendarGenerator {
    pub fn new(db: SqlitePool, generator: Arc<dyn TextGenerator>, config: PlannerConfig) -> Self {
        Self {
            db,
            generator,
            rules: Arc::new(KeywordRules),
            config,
        }
    }

    /// Replace the channel-rule predicate
    pub fn with_rules(mut self, rules: Arc<dyn RulePredicate>) -> Self {
        self.rules = rules;
        self
    }

    fn rng(&self, seed_override: Option<u64>) -> StdRng {
        match seed_override.or(self.config.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    async fn load_context(&self, company_id: &str) -> PlannerResult<CompanyContext> {
        let company = db::companies::load_company(&self.db, company_id)
            .await?
            .ok_or_else(|| PlannerError::Configuration(format!("Company '{}' not found", company_id)))?;

        let identities = db::identities::load_identities(&self.db, company_id).await?;
        if identities.is_empty() {
            return Err(PlannerError::Configuration(format!(
                "Company '{}' has no identities",
                company_id
            )));
        }

        let channels = db::channels::load_channels(&self.db, company_id).await?;
        if channels.is_empty() {
            return Err(PlannerError::Configuration(format!(
                "Company '{}' has no channels",
                company_id
            )));
        }

        Ok(CompanyContext {
            company,
            identities,
            channels,
        })
    }

    /// Generate (or regenerate) one company's week
    pub async fn generate(&self, request: &GenerationRequest) -> PlannerResult<GenerationReport> {
        self.generate_seeded(request, None).await
    }

    /// Generate with an explicit seed, overriding the configured one
    pub async fn generate_seeded(
        &self,
        request: &GenerationRequest,
        seed: Option<u64>,
    ) -> PlannerResult<GenerationReport> {
        if request.post_count == 0 {
            return Err(PlannerError::Configuration("Post count must be at least 1".to_string()));
        }

        let week_start = week_start_for(request.week_start);
        if week_start != request.week_start {
            info!(
                requested = %request.week_start,
                week_start = %week_start,
                "Week start moved back to Sunday"
            );
        }

        // Phase 1: configuration
        let ctx = self.load_context(&request.company_id).await?;
        let mut rng = self.rng(seed);

        info!(
            company = %ctx.company.id,
            week_start = %week_start,
            posts = request.post_count,
            identities = ctx.identities.len(),
            channels = ctx.channels.len(),
            generator = self.generator.name(),
            "Starting calendar generation"
        );

        let calendar_id =
            db::calendars::upsert_calendar(&self.db, &ctx.company.id, week_start, request.post_count).await?;
        let removed = db::calendars::clear_calendar(&self.db, calendar_id).await?;
        if removed > 0 {
            info!(calendar_id = %calendar_id, removed, "Replacing previous plan for this week");
            db::channels::reset_week_activity(&self.db, &ctx.company.id, week_start).await?;
        }

        // Phase 2: posts
        let posts = self
            .phase_posts(&ctx, calendar_id, week_start, request.post_count, &mut rng)
            .await?;

        if posts.is_empty() {
            if let Err(e) = db::calendars::update_created_counts(&self.db, calendar_id, 0, 0).await {
                warn!(error = %e, "Failed to store created counts");
            }
            return Err(PlannerError::NothingCreated {
                planned: request.post_count as usize,
            });
        }

        // Phase 3: replies
        let conversation = ConversationPlanner::new(&self.config);
        let replies = conversation
            .build(self.generator.as_ref(), &posts, &ctx.identities, &mut rng)
            .await;
        let planned_replies = replies.len();

        let mut created_replies = Vec::with_capacity(replies.len());
        for reply in replies {
            match db::calendars::insert_reply(&self.db, calendar_id, &reply).await {
                Ok(()) => created_replies.push(reply),
                Err(e) => warn!(reply_id = %reply.id, error = %e, "Failed to persist reply, skipping"),
            }
        }

        if let Err(e) =
            db::calendars::update_created_counts(&self.db, calendar_id, posts.len(), created_replies.len()).await
        {
            warn!(error = %e, "Failed to store created counts");
        }

        // Phase 4: audit and score
        let mut report = self
            .phase_scoring(&ctx, calendar_id, week_start, &posts, &created_replies)
            .await?;
        report.planned_posts = request.post_count as usize;
        report.planned_replies = planned_replies;

        info!(
            calendar_id = %calendar_id,
            created_posts = report.created_posts,
            planned_posts = report.planned_posts,
            created_replies = report.created_replies,
            overall = report.quality.overall,
            risk = report.risk_score,
            "Calendar generation complete"
        );

        Ok(report)
    }

    /// Re-run the auditor and scorer over a stored calendar
    pub async fn rescore(&self, calendar_id: Uuid) -> PlannerResult<GenerationReport> {
        let calendar = db::calendars::load_calendar(&self.db, calendar_id)
            .await?
            .ok_or_else(|| ocp_common::Error::NotFound(format!("calendar {}", calendar_id)))?;

        let ctx = self.load_context(&calendar.company_id).await?;
        let posts = db::calendars::load_posts(&self.db, calendar_id).await?;
        let replies = db::calendars::load_replies(&self.db, calendar_id).await?;

        let mut report = self
            .phase_scoring(&ctx, calendar_id, calendar.week_start, &posts, &replies)
            .await?;
        report.planned_posts = calendar.requested_posts as usize;
        report.planned_replies = replies.len();

        info!(calendar_id = %calendar_id, overall = report.quality.overall, "Calendar rescored");
        Ok(report)
    }

    /// Stored calendar with posts and replies
    pub async fn load_view(&self, calendar_id: Uuid) -> PlannerResult<CalendarView> {
        let calendar = db::calendars::load_calendar(&self.db, calendar_id)
            .await?
            .ok_or_else(|| ocp_common::Error::NotFound(format!("calendar {}", calendar_id)))?;
        let posts = db::calendars::load_posts(&self.db, calendar_id).await?;
        let replies = db::calendars::load_replies(&self.db, calendar_id).await?;

        Ok(CalendarView {
            calendar,
            posts,
            replies,
        })
    }
}
