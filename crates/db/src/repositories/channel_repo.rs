//! Repository for the `channels` table.

use handpicked_core::channels::pick_default_channel;
use handpicked_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::channel::{Channel, CreateChannel, UpdateChannel};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, title, description, category, is_public, \
                       is_highlight, highlight_order, created_at, updated_at";

/// Provides CRUD operations for channels.
///
/// Highlight fields are read here but only written by
/// [`HighlightRepo`](super::HighlightRepo).
pub struct ChannelRepo;

impl ChannelRepo {
    /// Insert a new channel together with its timeline anchored at
    /// `start_time`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateChannel,
        start_time: Timestamp,
    ) -> Result<Channel, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO channels (slug, title, description, category, is_public) \
             VALUES ($1, $2, $3, $4, COALESCE($5, true)) \
             RETURNING {COLUMNS}"
        );
        let channel = sqlx::query_as::<_, Channel>(&query)
            .bind(&input.slug)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.is_public)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO channel_timelines (channel_id, start_time) VALUES ($1, $2)")
            .bind(channel.id)
            .bind(start_time)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(channel_id = channel.id, slug = %channel.slug, "Channel created");
        Ok(channel)
    }

    /// Find a channel by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channels WHERE id = $1");
        sqlx::query_as::<_, Channel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a channel by its URL slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM channels WHERE slug = $1");
        sqlx::query_as::<_, Channel>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List public channels, oldest first.
    pub async fn list_public(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM channels WHERE is_public = true ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Channel>(&query).fetch_all(pool).await
    }

    /// List highlighted channels in rank order.
    pub async fn list_highlighted(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM channels \
             WHERE is_highlight = true \
             ORDER BY highlight_order NULLS LAST, id"
        );
        sqlx::query_as::<_, Channel>(&query).fetch_all(pool).await
    }

    /// List public channels that could be added to the highlights, by title.
    pub async fn list_highlight_candidates(pool: &PgPool) -> Result<Vec<Channel>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM channels \
             WHERE is_highlight = false AND is_public = true \
             ORDER BY title, id"
        );
        sqlx::query_as::<_, Channel>(&query).fetch_all(pool).await
    }

    /// The channel a viewer lands on without choosing one.
    pub async fn find_default(pool: &PgPool) -> Result<Option<Channel>, sqlx::Error> {
        let channels = Self::list_public(pool).await?;
        Ok(pick_default_channel(&channels).cloned())
    }

    /// Update a channel. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateChannel,
    ) -> Result<Option<Channel>, sqlx::Error> {
        let query = format!(
            "UPDATE channels SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                category = COALESCE($4, category), \
                is_public = COALESCE($5, is_public) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Channel>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.category)
            .bind(input.is_public)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a channel with its schedule and timeline.
    ///
    /// A highlighted channel must be demoted first, otherwise its rank would
    /// leave a gap.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM channels WHERE id = $1 AND is_highlight = false")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
