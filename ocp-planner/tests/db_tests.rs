//! Persistence tests for the planner tables

mod helpers;

use chrono::{Duration, NaiveDate};
use helpers::*;
use ocp_planner::db;
use ocp_planner::models::{PlannedPost, PostKind, Strategy};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn post_on(day: NaiveDate, identity: &str, channel: &str, topic: &str) -> PlannedPost {
    PlannedPost {
        id: Uuid::new_v4(),
        day_of_week: 1,
        scheduled_date: day,
        scheduled_hour: 9,
        order_in_day: 0,
        channel_id: channel.to_string(),
        topic: topic.to_string(),
        identity_id: identity.to_string(),
        kind: PostKind::Advice,
        strategy: Strategy::Value,
        title: None,
        body: None,
    }
}

#[tokio::test]
async fn test_company_round_trip() {
    let pool = seeded_pool().await;

    let loaded = db::companies::load_company(&pool, COMPANY_ID).await.unwrap().unwrap();
    assert_eq!(loaded.pain_points, company().pain_points);
    assert_eq!(loaded.target_users, vec!["founders".to_string()]);

    assert!(db::companies::load_company(&pool, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_identities_and_channels_ordered_by_id() {
    let pool = seeded_pool().await;

    let identities = db::identities::load_identities(&pool, COMPANY_ID).await.unwrap();
    let ids: Vec<_> = identities.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["id-a", "id-b"]);
    assert_eq!(identities[1].expertise, vec!["operations".to_string()]);

    let channels = db::channels::load_channels(&pool, COMPANY_ID).await.unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].min_cooldown_days, 7);
    assert_eq!(channels[1].max_posts_per_week, 3);
}

#[tokio::test]
async fn test_channel_activity_counts_and_keeps_latest_date() {
    let pool = seeded_pool().await;
    let ws = week_start();

    db::channels::record_channel_post(&pool, "ch-a", COMPANY_ID, ws, date(2024, 6, 5)).await.unwrap();
    db::channels::record_channel_post(&pool, "ch-a", COMPANY_ID, ws, date(2024, 6, 3)).await.unwrap();

    let activity = db::channels::load_latest_activity(&pool, COMPANY_ID, ws).await.unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].posts_this_week, 2);
    // An earlier date recorded later must not move the last post back
    assert_eq!(activity[0].last_post_date, Some(date(2024, 6, 5)));
}

#[tokio::test]
async fn test_latest_activity_falls_back_to_prior_week() {
    let pool = seeded_pool().await;
    let ws = week_start();
    let previous = ws - Duration::days(7);

    db::channels::record_channel_post(&pool, "ch-a", COMPANY_ID, previous, date(2024, 5, 31)).await.unwrap();
    db::channels::record_channel_post(&pool, "ch-b", COMPANY_ID, previous, date(2024, 5, 28)).await.unwrap();
    db::channels::record_channel_post(&pool, "ch-b", COMPANY_ID, ws, date(2024, 6, 4)).await.unwrap();

    let mut activity = db::channels::load_latest_activity(&pool, COMPANY_ID, ws).await.unwrap();
    activity.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));

    assert_eq!(activity[0].week_start, previous);
    assert_eq!(activity[1].week_start, ws);
    assert_eq!(activity[1].last_post_date, Some(date(2024, 6, 4)));

    let removed = db::channels::reset_week_activity(&pool, COMPANY_ID, ws).await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_topic_history_upserts_on_normalised_text() {
    let pool = seeded_pool().await;

    db::history::record_topic_use(&pool, COMPANY_ID, "Content planning tips", date(2024, 6, 3))
        .await
        .unwrap();
    db::history::record_topic_use(&pool, COMPANY_ID, "content planning tips!", date(2024, 6, 1))
        .await
        .unwrap();
    db::history::record_topic_use(&pool, COMPANY_ID, "Hiring a first engineer", date(2024, 5, 20))
        .await
        .unwrap();

    let history = db::history::load_topic_history(&pool, COMPANY_ID).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].usage_count, 2);
    assert_eq!(history[0].last_used, date(2024, 6, 3));
    assert_eq!(history[1].usage_count, 1);
}

#[tokio::test]
async fn test_calendar_row_reused_per_week() {
    let pool = seeded_pool().await;
    let ws = week_start();

    let first = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws, 5).await.unwrap();
    let second = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws, 7).await.unwrap();
    let other = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws + Duration::days(7), 3)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_ne!(first, other);

    let calendar = db::calendars::load_calendar(&pool, first).await.unwrap().unwrap();
    assert_eq!(calendar.requested_posts, 7);
    assert!(calendar.quality.is_none());
}

#[tokio::test]
async fn test_clear_calendar_counts_removed_posts() {
    let pool = seeded_pool().await;
    let calendar_id = db::calendars::upsert_calendar(&pool, COMPANY_ID, week_start(), 2).await.unwrap();

    for topic in ["First topic", "Second topic"] {
        let post = post_on(date(2024, 6, 3), "id-a", "ch-a", topic);
        db::calendars::insert_post(&pool, calendar_id, COMPANY_ID, &post).await.unwrap();
    }

    assert_eq!(db::calendars::clear_calendar(&pool, calendar_id).await.unwrap(), 2);
    assert!(db::calendars::load_posts(&pool, calendar_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_prior_posts_window() {
    let pool = seeded_pool().await;
    let ws = week_start();

    let old = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws - Duration::days(35), 1).await.unwrap();
    let recent = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws - Duration::days(7), 2).await.unwrap();
    let current = db::calendars::upsert_calendar(&pool, COMPANY_ID, ws, 1).await.unwrap();

    let posts = [
        (old, post_on(date(2024, 4, 30), "id-a", "ch-a", "Too old")),
        (recent, post_on(date(2024, 5, 27), "id-a", "ch-a", "Older in window")),
        (recent, post_on(date(2024, 5, 30), "id-b", "ch-b", "Newest in window")),
        (current, post_on(date(2024, 6, 3), "id-b", "ch-a", "This week")),
    ];
    for (calendar_id, post) in &posts {
        db::calendars::insert_post(&pool, *calendar_id, COMPANY_ID, post).await.unwrap();
    }

    let prior = db::calendars::load_prior_posts(&pool, COMPANY_ID, ws, 4).await.unwrap();
    let topics: Vec<_> = prior.iter().map(|p| p.topic.as_str()).collect();
    assert_eq!(topics, vec!["Newest in window", "Older in window"]);
}

#[tokio::test]
async fn test_update_scores_on_missing_calendar_is_not_found() {
    let pool = seeded_pool().await;

    let result = db::calendars::update_scores(
        &pool,
        Uuid::new_v4(),
        &Default::default(),
        &[],
        0.0,
        true,
    )
    .await;

    assert!(matches!(result, Err(ocp_common::Error::NotFound(_))));
}
