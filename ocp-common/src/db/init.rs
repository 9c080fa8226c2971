//! Database initialization
//!
//! Opens (or creates) the SQLite database and creates every table the
//! planner reads or writes. Table creation is idempotent, so calling
//! `init_database` against an existing file is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers proceed while a generation run writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    configure_and_create(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection: every pooled connection to `sqlite::memory:`
/// would otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    configure_and_create(&pool).await?;

    Ok(pool)
}

async fn configure_and_create(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    create_companies_table(pool).await?;
    create_identities_table(pool).await?;
    create_channels_table(pool).await?;
    create_channel_activity_table(pool).await?;
    create_topic_history_table(pool).await?;
    create_calendars_table(pool).await?;
    create_planned_posts_table(pool).await?;
    create_planned_replies_table(pool).await?;

    Ok(())
}

async fn create_companies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            target_users TEXT NOT NULL DEFAULT '[]',
            pain_points TEXT NOT NULL DEFAULT '[]',
            tone TEXT NOT NULL DEFAULT 'helpful',
            search_queries TEXT NOT NULL DEFAULT '[]',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_identities_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS identities (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            tone TEXT NOT NULL DEFAULT 'helpful',
            expertise TEXT NOT NULL DEFAULT '[]',
            account_handle TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_identities_company ON identities(company_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_channels_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            rules TEXT NOT NULL DEFAULT '',
            min_cooldown_days INTEGER NOT NULL DEFAULT 3,
            max_posts_per_week INTEGER NOT NULL DEFAULT 2,
            size TEXT NOT NULL DEFAULT 'medium'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_company ON channels(company_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_channel_activity_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channel_activity (
            channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            week_start TEXT NOT NULL,
            last_post_date TEXT,
            posts_this_week INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (channel_id, company_id, week_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_topic_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS topic_history (
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            normalized_topic TEXT NOT NULL,
            topic TEXT NOT NULL,
            last_used TEXT NOT NULL,
            usage_count INTEGER NOT NULL DEFAULT 1,
            PRIMARY KEY (company_id, normalized_topic)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_calendars_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS calendars (
            id TEXT PRIMARY KEY,
            company_id TEXT NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
            week_start TEXT NOT NULL,
            requested_posts INTEGER NOT NULL,
            created_posts INTEGER NOT NULL DEFAULT 0,
            created_replies INTEGER NOT NULL DEFAULT 0,
            quality_score TEXT,
            warnings TEXT NOT NULL DEFAULT '[]',
            risk_score REAL NOT NULL DEFAULT 0.0,
            audit_passed INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (company_id, week_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_planned_posts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS planned_posts (
            id TEXT PRIMARY KEY,
            calendar_id TEXT NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
            company_id TEXT NOT NULL,
            day_of_week INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            scheduled_date TEXT NOT NULL,
            scheduled_hour INTEGER NOT NULL DEFAULT 9,
            order_in_day INTEGER NOT NULL DEFAULT 0,
            channel_id TEXT NOT NULL,
            identity_id TEXT NOT NULL,
            topic TEXT NOT NULL,
            post_kind TEXT NOT NULL,
            strategy TEXT NOT NULL,
            title TEXT,
            body TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_planned_posts_calendar ON planned_posts(calendar_id)",
    )
    .execute(pool)
    .await?;

    // Auditor history lookups: prior weeks by company, newest first
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_planned_posts_company_date ON planned_posts(company_id, scheduled_date)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_planned_replies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS planned_replies (
            id TEXT PRIMARY KEY,
            calendar_id TEXT NOT NULL REFERENCES calendars(id) ON DELETE CASCADE,
            post_id TEXT NOT NULL REFERENCES planned_posts(id) ON DELETE CASCADE,
            identity_id TEXT NOT NULL,
            intent TEXT NOT NULL,
            hours_after_post REAL NOT NULL CHECK (hours_after_post >= 0.5),
            tone TEXT NOT NULL,
            emotion TEXT NOT NULL,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_planned_replies_calendar ON planned_replies(calendar_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
