//! Channel and channel-activity database operations
//!
//! Activity counters are bumped with a single atomic upsert so two runs
//! writing the same (channel, company, week) never lose an increment.

use chrono::NaiveDate;
use ocp_common::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

use super::parse_label;
use crate::models::{Channel, ChannelActivity};

/// Insert or replace a channel owned by `company_id`
pub async fn save_channel(pool: &SqlitePool, company_id: &str, channel: &Channel) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO channels (id, company_id, name, rules, min_cooldown_days, max_posts_per_week, size)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            company_id = excluded.company_id,
            name = excluded.name,
            rules = excluded.rules,
            min_cooldown_days = excluded.min_cooldown_days,
            max_posts_per_week = excluded.max_posts_per_week,
            size = excluded.size
        "#,
    )
    .bind(&channel.id)
    .bind(company_id)
    .bind(&channel.name)
    .bind(&channel.rules)
    .bind(channel.min_cooldown_days as i64)
    .bind(channel.max_posts_per_week as i64)
    .bind(channel.size.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

/// All channels of a company, ordered by id
pub async fn load_channels(pool: &SqlitePool, company_id: &str) -> Result<Vec<Channel>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, rules, min_cooldown_days, max_posts_per_week, size
        FROM channels
        WHERE company_id = ?
        ORDER BY id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(Channel {
                id: row.get("id"),
                name: row.get("name"),
                rules: row.get("rules"),
                min_cooldown_days: row.get::<i64, _>("min_cooldown_days").max(0) as u32,
                max_posts_per_week: row.get::<i64, _>("max_posts_per_week").max(0) as u32,
                size: parse_label("size", &row.get::<String, _>("size"))?,
            })
        })
        .collect()
}

/// Latest activity row per channel at or before `week_start`
///
/// Earlier weeks still matter for cooldown, so a channel idle this week
/// reports its most recent prior week.
pub async fn load_latest_activity(
    pool: &SqlitePool,
    company_id: &str,
    week_start: NaiveDate,
) -> Result<Vec<ChannelActivity>> {
    let rows = sqlx::query(
        r#"
        SELECT channel_id, company_id, week_start, last_post_date, posts_this_week
        FROM channel_activity
        WHERE company_id = ? AND week_start <= ?
        ORDER BY week_start DESC
        "#,
    )
    .bind(company_id)
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    let mut seen = HashSet::new();
    let mut latest = Vec::new();
    for row in rows {
        let channel_id: String = row.get("channel_id");
        if !seen.insert(channel_id.clone()) {
            continue;
        }
        latest.push(ChannelActivity {
            channel_id,
            company_id: row.get("company_id"),
            week_start: row.get("week_start"),
            last_post_date: row.get("last_post_date"),
            posts_this_week: row.get::<i64, _>("posts_this_week").max(0) as u32,
        });
    }
    Ok(latest)
}

/// Count one post placed on `post_date`
pub async fn record_channel_post(
    pool: &SqlitePool,
    channel_id: &str,
    company_id: &str,
    week_start: NaiveDate,
    post_date: NaiveDate,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO channel_activity (channel_id, company_id, week_start, last_post_date, posts_this_week)
        VALUES (?, ?, ?, ?, 1)
        ON CONFLICT(channel_id, company_id, week_start) DO UPDATE SET
            posts_this_week = posts_this_week + 1,
            last_post_date = MAX(COALESCE(last_post_date, excluded.last_post_date), excluded.last_post_date)
        "#,
    )
    .bind(channel_id)
    .bind(company_id)
    .bind(week_start)
    .bind(post_date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Drop a week's activity before that week is regenerated
pub async fn reset_week_activity(pool: &SqlitePool, company_id: &str, week_start: NaiveDate) -> Result<u64> {
    let result = sqlx::query("DELETE FROM channel_activity WHERE company_id = ? AND week_start = ?")
        .bind(company_id)
        .bind(week_start)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
