//! Repository for the `channel_schedules` table.

use handpicked_core::types::DbId;
use sqlx::PgPool;

use crate::models::schedule_item::{CreateScheduleItem, NewScheduleItem, ScheduleItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, channel_id, position, youtube_video_id, title, duration_seconds, \
                       is_disabled, last_error_code, last_error_message, last_checked_at, \
                       created_at, updated_at";

/// Provides CRUD operations for schedule items.
pub struct ScheduleItemRepo;

impl ScheduleItemRepo {
    /// Insert a new schedule item, returning the created row.
    ///
    /// `resolved` holds the video id and length returned by
    /// [`CreateScheduleItem::validate`]. Without an explicit position the item
    /// is appended after the channel's current last position.
    pub async fn create(
        pool: &PgPool,
        input: &CreateScheduleItem,
        resolved: &NewScheduleItem,
    ) -> Result<ScheduleItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO channel_schedules \
                (channel_id, position, youtube_video_id, title, duration_seconds) \
             VALUES ($1, \
                COALESCE($2, (SELECT COALESCE(MAX(position), -1) + 1 \
                              FROM channel_schedules WHERE channel_id = $1)), \
                $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleItem>(&query)
            .bind(input.channel_id)
            .bind(input.position)
            .bind(&resolved.video_id)
            .bind(&input.title)
            .bind(resolved.duration_seconds)
            .fetch_one(pool)
            .await
    }

    /// Find a schedule item by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ScheduleItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channel_schedules WHERE id = $1");
        sqlx::query_as::<_, ScheduleItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a channel's schedule in position order, disabled items included.
    ///
    /// The returned indices are the ones playback state refers to.
    pub async fn list_for_channel(
        pool: &PgPool,
        channel_id: DbId,
    ) -> Result<Vec<ScheduleItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM channel_schedules \
             WHERE channel_id = $1 \
             ORDER BY position, id"
        );
        sqlx::query_as::<_, ScheduleItem>(&query)
            .bind(channel_id)
            .fetch_all(pool)
            .await
    }

    /// Disable an item after the player reported it unavailable.
    ///
    /// Records the error code and message. Returns `None` if the item does
    /// not exist.
    pub async fn disable_for_error(
        pool: &PgPool,
        id: DbId,
        error_code: i32,
        error_message: &str,
    ) -> Result<Option<ScheduleItem>, sqlx::Error> {
        let query = format!(
            "UPDATE channel_schedules SET \
                is_disabled = true, \
                last_error_code = $2, \
                last_error_message = $3, \
                last_checked_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let item = sqlx::query_as::<_, ScheduleItem>(&query)
            .bind(id)
            .bind(error_code)
            .bind(error_message)
            .fetch_optional(pool)
            .await?;
        if let Some(item) = &item {
            tracing::warn!(
                schedule_item_id = item.id,
                channel_id = item.channel_id,
                error_code,
                "Schedule item disabled after playback failure"
            );
        }
        Ok(item)
    }

    /// Manually disable or re-enable an item.
    ///
    /// Re-enabling clears the recorded error. Returns `None` if the item does
    /// not exist.
    pub async fn set_disabled(
        pool: &PgPool,
        id: DbId,
        disabled: bool,
    ) -> Result<Option<ScheduleItem>, sqlx::Error> {
        let query = format!(
            "UPDATE channel_schedules SET \
                is_disabled = $2, \
                last_error_code = CASE WHEN $2 THEN last_error_code END, \
                last_error_message = CASE WHEN $2 THEN last_error_message END \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ScheduleItem>(&query)
            .bind(id)
            .bind(disabled)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a schedule item.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM channel_schedules WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
