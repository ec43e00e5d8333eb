//! Highlight ranking persistence.
//!
//! Every operation runs in its own transaction that first takes a
//! transaction-scoped advisory lock, so highlight mutations are serialized
//! across all connections. Writes are additionally conditional on the order
//! last read; any error drops the transaction, rolling back partial writes.

use handpicked_core::highlight::{
    self, check_dense, DemoteOutcome, HighlightError, HighlightRank, HighlightStore,
    OrderViolation, SwapDirection, SwapOutcome,
};
use handpicked_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

/// Advisory lock key reserved for highlight-order mutations.
const HIGHLIGHT_LOCK_KEY: i64 = 0x6869_6768_6c69_6768;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// [`HighlightStore`] backed by one Postgres transaction.
pub struct PgHighlightStore {
    tx: Transaction<'static, Postgres>,
}

impl PgHighlightStore {
    /// Open a transaction and take the highlight advisory lock.
    pub async fn begin(pool: &PgPool) -> Result<Self, HighlightError> {
        let mut tx = pool.begin().await.map_err(HighlightError::store)?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(HIGHLIGHT_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(HighlightError::store)?;
        Ok(Self { tx })
    }

    /// Commit all writes made through this store and release the lock.
    pub async fn commit(self) -> Result<(), HighlightError> {
        self.tx.commit().await.map_err(HighlightError::store)
    }
}

impl HighlightStore for PgHighlightStore {
    async fn find_rank(
        &mut self,
        channel_id: DbId,
    ) -> Result<Option<HighlightRank>, HighlightError> {
        let row: Option<(bool, Option<i32>)> = sqlx::query_as(
            "SELECT is_highlight, highlight_order FROM channels WHERE id = $1 FOR UPDATE",
        )
        .bind(channel_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(HighlightError::store)?;

        Ok(row.map(|(is_highlight, highlight_order)| HighlightRank {
            channel_id,
            is_highlight,
            highlight_order,
        }))
    }

    async fn max_order(&mut self) -> Result<Option<i32>, HighlightError> {
        sqlx::query_scalar::<_, Option<i32>>(
            "SELECT MAX(highlight_order) FROM channels WHERE is_highlight = true",
        )
        .fetch_one(&mut *self.tx)
        .await
        .map_err(HighlightError::store)
    }

    async fn find_by_order(&mut self, order: i32) -> Result<Option<DbId>, HighlightError> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM channels \
             WHERE is_highlight = true AND highlight_order = $1 \
             ORDER BY id LIMIT 1",
        )
        .bind(order)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(HighlightError::store)
    }

    async fn write_rank(
        &mut self,
        channel_id: DbId,
        expected: Option<i32>,
        new_order: Option<i32>,
    ) -> Result<bool, HighlightError> {
        let result = sqlx::query(
            "UPDATE channels SET highlight_order = $3, is_highlight = $4 \
             WHERE id = $1 AND highlight_order IS NOT DISTINCT FROM $2",
        )
        .bind(channel_id)
        .bind(expected)
        .bind(new_order)
        .bind(new_order.is_some())
        .execute(&mut *self.tx)
        .await
        .map_err(HighlightError::store)?;
        Ok(result.rows_affected() > 0)
    }

    async fn shift_down_after(&mut self, removed: i32) -> Result<u64, HighlightError> {
        let result = sqlx::query(
            "UPDATE channels SET highlight_order = highlight_order - 1 \
             WHERE is_highlight = true AND highlight_order > $1",
        )
        .bind(removed)
        .execute(&mut *self.tx)
        .await
        .map_err(HighlightError::store)?;
        Ok(result.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Transactional highlight operations.
pub struct HighlightRepo;

impl HighlightRepo {
    /// Append a channel to the highlights. Returns its new order.
    pub async fn promote(pool: &PgPool, channel_id: DbId) -> Result<i32, HighlightError> {
        let mut store = PgHighlightStore::begin(pool).await?;
        let order = highlight::promote(&mut store, channel_id).await?;
        store.commit().await?;
        tracing::info!(channel_id, order, "Channel added to highlights");
        Ok(order)
    }

    /// Remove a channel from the highlights and compact the ranks after it.
    pub async fn demote(pool: &PgPool, channel_id: DbId) -> Result<DemoteOutcome, HighlightError> {
        let mut store = PgHighlightStore::begin(pool).await?;
        let outcome = highlight::demote(&mut store, channel_id).await?;
        store.commit().await?;
        tracing::info!(channel_id, ?outcome, "Channel removed from highlights");
        Ok(outcome)
    }

    /// Swap a channel with its neighbour, given the caller's view of its
    /// current order and of the last order.
    pub async fn swap(
        pool: &PgPool,
        channel_id: DbId,
        current_order: i32,
        direction: SwapDirection,
        max_order: i32,
    ) -> Result<SwapOutcome, HighlightError> {
        let mut store = PgHighlightStore::begin(pool).await?;
        let outcome =
            highlight::swap(&mut store, channel_id, current_order, direction, max_order).await?;
        Self::finish_swap(store, channel_id, outcome).await
    }

    /// Move a channel one slot up, reading its order from the table.
    pub async fn swap_up(pool: &PgPool, channel_id: DbId) -> Result<SwapOutcome, HighlightError> {
        let mut store = PgHighlightStore::begin(pool).await?;
        let outcome = highlight::swap_up(&mut store, channel_id).await?;
        Self::finish_swap(store, channel_id, outcome).await
    }

    /// Move a channel one slot down, reading its order from the table.
    pub async fn swap_down(
        pool: &PgPool,
        channel_id: DbId,
    ) -> Result<SwapOutcome, HighlightError> {
        let mut store = PgHighlightStore::begin(pool).await?;
        let outcome = highlight::swap_down(&mut store, channel_id).await?;
        Self::finish_swap(store, channel_id, outcome).await
    }

    async fn finish_swap(
        store: PgHighlightStore,
        channel_id: DbId,
        outcome: SwapOutcome,
    ) -> Result<SwapOutcome, HighlightError> {
        store.commit().await?;
        match outcome {
            SwapOutcome::Swapped { new_order, .. } => {
                tracing::info!(channel_id, new_order, "Highlight order swapped");
            }
            SwapOutcome::AtBoundary => {
                tracing::debug!(channel_id, "Highlight swap declined at boundary");
            }
        }
        Ok(outcome)
    }

    /// Check the stored highlight orders for gaps and duplicates.
    ///
    /// Only reports; never rewrites orders.
    pub async fn audit(pool: &PgPool) -> Result<Result<(), OrderViolation>, sqlx::Error> {
        let orders: Vec<i32> = sqlx::query_scalar(
            "SELECT highlight_order FROM channels \
             WHERE is_highlight = true AND highlight_order IS NOT NULL",
        )
        .fetch_all(pool)
        .await?;

        let report = check_dense(orders);
        if let Err(violation) = &report {
            tracing::error!(%violation, "Highlight order table is inconsistent");
        }
        Ok(report)
    }
}
