//! Integration tests for schedules, timelines and playback state.
//!
//! Requires a Postgres reachable through `DATABASE_URL`.

use chrono::{Duration, TimeZone, Utc};
use handpicked_core::schedule::calculate_playback_state;
use handpicked_core::types::DbId;
use handpicked_db::models::channel::CreateChannel;
use handpicked_db::models::schedule_item::{
    CreateScheduleItem, NewScheduleItem, PlaybackFailureReport,
};
use handpicked_db::repositories::{ChannelRepo, ScheduleItemRepo, TimelineRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_channel(pool: &PgPool, slug: &str) -> DbId {
    let input = CreateChannel {
        slug: slug.to_string(),
        title: "Test".to_string(),
        description: None,
        category: Some("music".to_string()),
        is_public: None,
    };
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    ChannelRepo::create(pool, &input, start).await.unwrap().id
}

async fn add_item(pool: &PgPool, channel_id: DbId, video: &str, duration_seconds: i32) -> DbId {
    let input = CreateScheduleItem {
        channel_id,
        position: None,
        video: video.to_string(),
        title: None,
        duration_seconds: Some(duration_seconds),
        duration: None,
    };
    let resolved = input.validate().unwrap();
    ScheduleItemRepo::create(pool, &input, &resolved)
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_channel_creates_timeline(pool: PgPool) {
    let id = new_channel(&pool, "with-timeline").await;
    let timeline = TimelineRepo::find_by_channel(&pool, id).await.unwrap().unwrap();
    assert_eq!(
        timeline.start_time,
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_items_append_positions(pool: PgPool) {
    let channel = new_channel(&pool, "positions").await;
    add_item(&pool, channel, "aaaaaaaaaaa", 30).await;
    add_item(&pool, channel, "https://youtu.be/bbbbbbbbbbb", 20).await;

    let items = ScheduleItemRepo::list_for_channel(&pool, channel).await.unwrap();
    let positions: Vec<i32> = items.iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(items[1].youtube_video_id, "bbbbbbbbbbb");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_disabled_item_is_skipped_but_kept(pool: PgPool) {
    let channel = new_channel(&pool, "skip").await;
    add_item(&pool, channel, "aaaaaaaaaaa", 30).await;
    let b = add_item(&pool, channel, "bbbbbbbbbbb", 20).await;
    add_item(&pool, channel, "ccccccccccc", 10).await;

    let report = PlaybackFailureReport {
        schedule_item_id: b,
        error_code: 150,
        error_message: None,
    };
    let message = report.validate().unwrap();
    let disabled = ScheduleItemRepo::disable_for_error(&pool, b, report.error_code, &message)
        .await
        .unwrap()
        .unwrap();
    assert!(disabled.is_disabled);
    assert_eq!(disabled.last_error_code, Some(150));
    assert_eq!(disabled.last_error_message.as_deref(), Some("YouTube error 150"));
    assert_eq!(disabled.position, 1);

    let items = ScheduleItemRepo::list_for_channel(&pool, channel).await.unwrap();
    assert_eq!(items.len(), 3);

    let timeline = TimelineRepo::find_by_channel(&pool, channel).await.unwrap().unwrap();
    let now = timeline.start_time + Duration::seconds(35);
    let state = calculate_playback_state(&items, &timeline.anchor(), now).unwrap();
    assert_eq!(state.current_item.youtube_video_id, "ccccccccccc");
    assert_eq!(state.current_item_index, 2);
    assert_eq!(state.offset_seconds, 5);
    assert_eq!(state.total_duration_seconds, 40);

    let enabled = ScheduleItemRepo::set_disabled(&pool, b, false)
        .await
        .unwrap()
        .unwrap();
    assert!(!enabled.is_disabled);
    assert_eq!(enabled.last_error_code, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reset_timeline_restarts_loop(pool: PgPool) {
    let channel = new_channel(&pool, "restart").await;
    add_item(&pool, channel, "aaaaaaaaaaa", 30).await;
    add_item(&pool, channel, "bbbbbbbbbbb", 20).await;

    let now = Utc::now();
    let timeline = TimelineRepo::reset(&pool, channel, now).await.unwrap();
    let items = ScheduleItemRepo::list_for_channel(&pool, channel).await.unwrap();
    let state = calculate_playback_state(&items, &timeline.anchor(), now).unwrap();
    assert_eq!(state.current_item_index, 0);
    assert_eq!(state.offset_seconds, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_zero_duration_is_rejected_by_schema(pool: PgPool) {
    let channel = new_channel(&pool, "zero").await;
    let input = CreateScheduleItem {
        channel_id: channel,
        position: None,
        video: "aaaaaaaaaaa".to_string(),
        title: None,
        duration_seconds: Some(0),
        duration: None,
    };
    let resolved = NewScheduleItem {
        video_id: "aaaaaaaaaaa".to_string(),
        duration_seconds: 0,
    };
    assert!(ScheduleItemRepo::create(&pool, &input, &resolved)
        .await
        .is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_catalog_duration_is_stored_in_seconds(pool: PgPool) {
    let channel = new_channel(&pool, "catalog").await;
    let input = CreateScheduleItem {
        channel_id: channel,
        position: None,
        video: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        title: Some("Catalog entry".to_string()),
        duration_seconds: None,
        duration: Some("PT4M13S".to_string()),
    };
    let resolved = input.validate().unwrap();
    let item = ScheduleItemRepo::create(&pool, &input, &resolved)
        .await
        .unwrap();

    assert_eq!(item.duration_seconds, 253);
    assert_eq!(item.youtube_video_id, "dQw4w9WgXcQ");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_default_channel_prefers_highlights(pool: PgPool) {
    let first = new_channel(&pool, "first").await;
    let second = new_channel(&pool, "second").await;

    let default = ChannelRepo::find_default(&pool).await.unwrap().unwrap();
    assert_eq!(default.id, first);

    handpicked_db::repositories::HighlightRepo::promote(&pool, second)
        .await
        .unwrap();
    let default = ChannelRepo::find_default(&pool).await.unwrap().unwrap();
    assert_eq!(default.id, second);
}
