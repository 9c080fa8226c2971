//! Audit and scoring phase

use super::{CalendarGenerator, CompanyContext, GenerationReport};
use crate::db;
use crate::error::PlannerResult;
use crate::models::{PlannedPost, PlannedReply};
use crate::validators::quality_scorer::QualityScorer;
use crate::validators::spam_auditor::SpamAuditor;
use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

impl CalendarGenerator {
    /// Audit and score a week, storing the result on the calendar row
    ///
    /// A failed score write is logged; the computed report is still returned.
    pub(super) async fn phase_scoring(
        &self,
        ctx: &CompanyContext,
        calendar_id: Uuid,
        week_start: NaiveDate,
        posts: &[PlannedPost],
        replies: &[PlannedReply],
    ) -> PlannerResult<GenerationReport> {
        let history = db::calendars::load_prior_posts(
            &self.db,
            &ctx.company.id,
            week_start,
            self.config.channel_history_weeks,
        )
        .await?;

        let audit = SpamAuditor::new(self.config.historical_topic_window).audit(
            posts,
            &ctx.channels,
            &ctx.identities,
            &history,
        );
        let quality = QualityScorer::default().score(posts, replies, &ctx.identities, &ctx.channels, &audit);

        if let Err(e) = db::calendars::update_scores(
            &self.db,
            calendar_id,
            &quality,
            &audit.warnings,
            audit.risk_score,
            audit.passed,
        )
        .await
        {
            warn!(calendar_id = %calendar_id, error = %e, "Failed to store calendar scores");
        }

        Ok(GenerationReport {
            calendar_id,
            planned_posts: posts.len(),
            created_posts: posts.len(),
            planned_replies: replies.len(),
            created_replies: replies.len(),
            quality,
            warnings: audit.warnings,
            risk_score: audit.risk_score,
            audit_passed: audit.passed,
        })
    }
}
