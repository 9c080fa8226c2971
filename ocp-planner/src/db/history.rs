//! Topic history database operations

use chrono::NaiveDate;
use ocp_common::Result;
use sqlx::{Row, SqlitePool};

use crate::models::TopicHistoryEntry;
use crate::text::normalize;

/// Every history entry of a company, newest first
pub async fn load_topic_history(pool: &SqlitePool, company_id: &str) -> Result<Vec<TopicHistoryEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT company_id, topic, last_used, usage_count
        FROM topic_history
        WHERE company_id = ?
        ORDER BY last_used DESC, topic
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| TopicHistoryEntry {
            company_id: row.get("company_id"),
            topic: row.get("topic"),
            last_used: row.get("last_used"),
            usage_count: row.get::<i64, _>("usage_count").max(0) as u32,
        })
        .collect())
}

/// Record a topic use, keyed by its normalised text
pub async fn record_topic_use(
    pool: &SqlitePool,
    company_id: &str,
    topic: &str,
    used_on: NaiveDate,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO topic_history (company_id, normalized_topic, topic, last_used, usage_count)
        VALUES (?, ?, ?, ?, 1)
        ON CONFLICT(company_id, normalized_topic) DO UPDATE SET
            topic = excluded.topic,
            last_used = MAX(last_used, excluded.last_used),
            usage_count = usage_count + 1
        "#,
    )
    .bind(company_id)
    .bind(normalize(topic))
    .bind(topic)
    .bind(used_on)
    .execute(pool)
    .await?;

    Ok(())
}
