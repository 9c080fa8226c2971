//! Shared fixtures for planner integration tests

#![allow(dead_code)]

use chrono::NaiveDate;
use ocp_planner::config::PlannerConfig;
use ocp_planner::db;
use ocp_planner::generator::{DisabledGenerator, TextGenerator};
use ocp_planner::models::{Channel, ChannelSize, Company, Identity};
use ocp_planner::CalendarGenerator;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const COMPANY_ID: &str = "acme";

/// Sunday 2024-06-02
pub fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
}

pub fn company() -> Company {
    Company {
        id: COMPANY_ID.to_string(),
        name: "Acme Planner".to_string(),
        description: "Planning tool for small teams".to_string(),
        target_users: vec!["founders".to_string()],
        pain_points: vec!["content planning".to_string(), "team alignment".to_string()],
        tone: "helpful".to_string(),
        search_queries: vec!["content calendar for startups".to_string()],
    }
}

pub fn identities() -> Vec<Identity> {
    vec![
        Identity {
            id: "id-a".to_string(),
            name: "Riley".to_string(),
            tone: "curious".to_string(),
            expertise: vec!["marketing".to_string()],
            account_handle: "u/riley".to_string(),
        },
        Identity {
            id: "id-b".to_string(),
            name: "Sam".to_string(),
            tone: "expert".to_string(),
            expertise: vec!["operations".to_string()],
            account_handle: "u/sam".to_string(),
        },
    ]
}

/// One strict channel (7-day cooldown, 2 per week) and one looser one
pub fn channels() -> Vec<Channel> {
    vec![
        Channel {
            id: "ch-a".to_string(),
            name: "r/startups".to_string(),
            rules: String::new(),
            min_cooldown_days: 7,
            max_posts_per_week: 2,
            size: ChannelSize::Medium,
        },
        Channel {
            id: "ch-b".to_string(),
            name: "r/smallbusiness".to_string(),
            rules: String::new(),
            min_cooldown_days: 3,
            max_posts_per_week: 3,
            size: ChannelSize::Medium,
        },
    ]
}

/// In-memory database holding the standard company, identities and channels
pub async fn seeded_pool() -> SqlitePool {
    let pool = ocp_common::db::init_memory_database().await.unwrap();
    db::companies::save_company(&pool, &company()).await.unwrap();
    for identity in identities() {
        db::identities::save_identity(&pool, COMPANY_ID, &identity).await.unwrap();
    }
    for channel in channels() {
        db::channels::save_channel(&pool, COMPANY_ID, &channel).await.unwrap();
    }
    pool
}

pub fn seeded_config() -> PlannerConfig {
    PlannerConfig {
        seed: Some(42),
        ..PlannerConfig::default()
    }
}

/// Planner with no text generation endpoint
pub fn offline_planner(pool: SqlitePool, config: PlannerConfig) -> CalendarGenerator {
    let generator: Arc<dyn TextGenerator> = Arc::new(DisabledGenerator);
    CalendarGenerator::new(pool, generator, config)
}
