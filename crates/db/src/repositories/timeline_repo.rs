//! Repository for the `channel_timelines` table.

use handpicked_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::timeline::ChannelTimeline;

const COLUMNS: &str = "channel_id, start_time, created_at, updated_at";

pub struct TimelineRepo;

impl TimelineRepo {
    /// Find the timeline of a channel.
    pub async fn find_by_channel(
        pool: &PgPool,
        channel_id: DbId,
    ) -> Result<Option<ChannelTimeline>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channel_timelines WHERE channel_id = $1");
        sqlx::query_as::<_, ChannelTimeline>(&query)
            .bind(channel_id)
            .fetch_optional(pool)
            .await
    }

    /// Load the timelines of several channels at once.
    pub async fn list_for_channels(
        pool: &PgPool,
        channel_ids: &[DbId],
    ) -> Result<Vec<ChannelTimeline>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channel_timelines WHERE channel_id = ANY($1)");
        sqlx::query_as::<_, ChannelTimeline>(&query)
            .bind(channel_ids)
            .fetch_all(pool)
            .await
    }

    /// Re-anchor a channel's loop at `start_time`, creating the timeline if
    /// the channel has none.
    pub async fn reset(
        pool: &PgPool,
        channel_id: DbId,
        start_time: Timestamp,
    ) -> Result<ChannelTimeline, sqlx::Error> {
        let query = format!(
            "INSERT INTO channel_timelines (channel_id, start_time) VALUES ($1, $2) \
             ON CONFLICT (channel_id) DO UPDATE SET start_time = EXCLUDED.start_time \
             RETURNING {COLUMNS}"
        );
        let timeline = sqlx::query_as::<_, ChannelTimeline>(&query)
            .bind(channel_id)
            .bind(start_time)
            .fetch_one(pool)
            .await?;
        tracing::info!(channel_id, %start_time, "Channel timeline reset");
        Ok(timeline)
    }
}
