//! Calendar, planned-post and planned-reply database operations
//!
//! One calendar row per (company, week). Regenerating a week reuses the
//! row and replaces its posts and replies.

use chrono::{Duration, NaiveDate};
use ocp_common::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::parse_label;
use crate::models::{PlannedPost, PlannedReply, PostRecord, QualityScore, SpamWarning};

/// Stored calendar summary
#[derive(Debug, Clone, Serialize)]
pub struct CalendarRecord {
    pub id: Uuid,
    pub company_id: String,
    pub week_start: NaiveDate,
    pub requested_posts: u32,
    pub created_posts: u32,
    pub created_replies: u32,
    pub quality: Option<QualityScore>,
    pub warnings: Vec<SpamWarning>,
    pub risk_score: f64,
    pub audit_passed: bool,
}

fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::InvalidInput(format!("{}: {}", column, e)))
}

/// Create the calendar for (company, week) or reuse the existing one
pub async fn upsert_calendar(
    pool: &SqlitePool,
    company_id: &str,
    week_start: NaiveDate,
    requested_posts: u32,
) -> Result<Uuid> {
    sqlx::query(
        r#"
        INSERT INTO calendars (id, company_id, week_start, requested_posts)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(company_id, week_start) DO UPDATE SET
            requested_posts = excluded.requested_posts,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(company_id)
    .bind(week_start)
    .bind(requested_posts as i64)
    .execute(pool)
    .await?;

    let id: String = sqlx::query_scalar("SELECT id FROM calendars WHERE company_id = ? AND week_start = ?")
        .bind(company_id)
        .bind(week_start)
        .fetch_one(pool)
        .await?;

    parse_uuid("calendars.id", &id)
}

/// Delete a calendar's posts and replies, returning the number of posts removed
pub async fn clear_calendar(pool: &SqlitePool, calendar_id: Uuid) -> Result<u64> {
    let id = calendar_id.to_string();

    sqlx::query("DELETE FROM planned_replies WHERE calendar_id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    let result = sqlx::query("DELETE FROM planned_posts WHERE calendar_id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn insert_post(pool: &SqlitePool, calendar_id: Uuid, company_id: &str, post: &PlannedPost) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO planned_posts (
            id, calendar_id, company_id, day_of_week, scheduled_date, scheduled_hour,
            order_in_day, channel_id, identity_id, topic, post_kind, strategy, title, body
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.id.to_string())
    .bind(calendar_id.to_string())
    .bind(company_id)
    .bind(post.day_of_week as i64)
    .bind(post.scheduled_date)
    .bind(post.scheduled_hour as i64)
    .bind(post.order_in_day as i64)
    .bind(&post.channel_id)
    .bind(&post.identity_id)
    .bind(&post.topic)
    .bind(post.kind.as_str())
    .bind(post.strategy.as_str())
    .bind(&post.title)
    .bind(&post.body)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_reply(pool: &SqlitePool, calendar_id: Uuid, reply: &PlannedReply) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO planned_replies (
            id, calendar_id, post_id, identity_id, intent, hours_after_post, tone, emotion, body
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(reply.id.to_string())
    .bind(calendar_id.to_string())
    .bind(reply.post_id.to_string())
    .bind(&reply.identity_id)
    .bind(reply.intent.as_str())
    .bind(reply.hours_after_post)
    .bind(&reply.tone)
    .bind(reply.emotion.as_str())
    .bind(&reply.body)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store how many posts and replies were actually created
pub async fn update_created_counts(
    pool: &SqlitePool,
    calendar_id: Uuid,
    created_posts: usize,
    created_replies: usize,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE calendars
        SET created_posts = ?, created_replies = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(created_posts as i64)
    .bind(created_replies as i64)
    .bind(calendar_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Store derived quality and audit results
pub async fn update_scores(
    pool: &SqlitePool,
    calendar_id: Uuid,
    quality: &QualityScore,
    warnings: &[SpamWarning],
    risk_score: f64,
    audit_passed: bool,
) -> Result<()> {
    let quality = serde_json::to_string(quality)?;
    let warnings = serde_json::to_string(warnings)?;

    let result = sqlx::query(
        r#"
        UPDATE calendars
        SET quality_score = ?, warnings = ?, risk_score = ?, audit_passed = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&quality)
    .bind(&warnings)
    .bind(risk_score)
    .bind(audit_passed)
    .bind(calendar_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("calendar {}", calendar_id)));
    }
    Ok(())
}

pub async fn load_calendar(pool: &SqlitePool, calendar_id: Uuid) -> Result<Option<CalendarRecord>> {
    let row = sqlx::query(
        r#"
        SELECT id, company_id, week_start, requested_posts, created_posts, created_replies,
               quality_score, warnings, risk_score, audit_passed
        FROM calendars
        WHERE id = ?
        "#,
    )
    .bind(calendar_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let quality = match row.get::<Option<String>, _>("quality_score") {
        Some(json) => Some(serde_json::from_str(&json)?),
        None => None,
    };

    Ok(Some(CalendarRecord {
        id: parse_uuid("calendars.id", &row.get::<String, _>("id"))?,
        company_id: row.get("company_id"),
        week_start: row.get("week_start"),
        requested_posts: row.get::<i64, _>("requested_posts").max(0) as u32,
        created_posts: row.get::<i64, _>("created_posts").max(0) as u32,
        created_replies: row.get::<i64, _>("created_replies").max(0) as u32,
        quality,
        warnings: serde_json::from_str(&row.get::<String, _>("warnings"))?,
        risk_score: row.get("risk_score"),
        audit_passed: row.get("audit_passed"),
    }))
}

/// A calendar's posts ordered by (day, order within day)
pub async fn load_posts(pool: &SqlitePool, calendar_id: Uuid) -> Result<Vec<PlannedPost>> {
    let rows = sqlx::query(
        r#"
        SELECT id, day_of_week, scheduled_date, scheduled_hour, order_in_day, channel_id,
               identity_id, topic, post_kind, strategy, title, body
        FROM planned_posts
        WHERE calendar_id = ?
        ORDER BY day_of_week, order_in_day
        "#,
    )
    .bind(calendar_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(PlannedPost {
                id: parse_uuid("planned_posts.id", &row.get::<String, _>("id"))?,
                day_of_week: row.get::<i64, _>("day_of_week").clamp(0, 6) as u8,
                scheduled_date: row.get("scheduled_date"),
                scheduled_hour: row.get::<i64, _>("scheduled_hour").clamp(0, 23) as u8,
                order_in_day: row.get::<i64, _>("order_in_day").max(0) as u32,
                channel_id: row.get("channel_id"),
                topic: row.get("topic"),
                identity_id: row.get("identity_id"),
                kind: parse_label("post_kind", &row.get::<String, _>("post_kind"))?,
                strategy: parse_label("strategy", &row.get::<String, _>("strategy"))?,
                title: row.get("title"),
                body: row.get("body"),
            })
        })
        .collect()
}

/// A calendar's replies in insertion order
pub async fn load_replies(pool: &SqlitePool, calendar_id: Uuid) -> Result<Vec<PlannedReply>> {
    let rows = sqlx::query(
        r#"
        SELECT id, post_id, identity_id, intent, hours_after_post, tone, emotion, body
        FROM planned_replies
        WHERE calendar_id = ?
        ORDER BY rowid
        "#,
    )
    .bind(calendar_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(PlannedReply {
                id: parse_uuid("planned_replies.id", &row.get::<String, _>("id"))?,
                post_id: parse_uuid("planned_replies.post_id", &row.get::<String, _>("post_id"))?,
                identity_id: row.get("identity_id"),
                intent: parse_label("intent", &row.get::<String, _>("intent"))?,
                hours_after_post: row.get("hours_after_post"),
                tone: row.get("tone"),
                emotion: parse_label("emotion", &row.get::<String, _>("emotion"))?,
                body: row.get("body"),
            })
        })
        .collect()
}

/// Posts from the `weeks` weeks before `week_start`, newest first
pub async fn load_prior_posts(
    pool: &SqlitePool,
    company_id: &str,
    week_start: NaiveDate,
    weeks: i64,
) -> Result<Vec<PostRecord>> {
    let from = week_start - Duration::days(7 * weeks.max(0));

    let rows = sqlx::query(
        r#"
        SELECT identity_id, channel_id, topic, scheduled_date
        FROM planned_posts
        WHERE company_id = ? AND scheduled_date >= ? AND scheduled_date < ?
        ORDER BY scheduled_date DESC, order_in_day DESC
        "#,
    )
    .bind(company_id)
    .bind(from)
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| PostRecord {
            identity_id: row.get("identity_id"),
            channel_id: row.get("channel_id"),
            topic: row.get("topic"),
            date: row.get("scheduled_date"),
        })
        .collect())
}
