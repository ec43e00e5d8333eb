//! Highlight order maintenance.
//!
//! Highlighted channels carry a dense zero-based rank (`highlight_order`):
//! the set of orders among highlighted channels is always exactly
//! `0..N`. Three mutations keep it that way:
//!
//! - [`promote`] appends a channel after the current maximum.
//! - [`demote`] clears a channel's rank and shifts every later rank down by one.
//! - [`swap`] (and [`swap_up`] / [`swap_down`]) exchanges a channel with its
//!   neighbour. Moving further than one slot takes repeated swaps.
//!
//! The operations read and write through a [`HighlightStore`]. Every write is
//! conditional on the order the caller last read, so a stale view surfaces as
//! [`HighlightError::StaleOrder`] instead of silently overwriting a concurrent
//! change. A store that spans several writes (e.g. a database transaction)
//! must be discarded, not committed, when an operation returns an error.
//! Inconsistent order tables are reported and never repaired here.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The highlight-relevant fields of a channel row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightRank {
    pub channel_id: DbId,
    pub is_highlight: bool,
    pub highlight_order: Option<i32>,
}

/// Direction of a single-step reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Towards order 0.
    Up,
    /// Towards `max_order`.
    Down,
}

impl SwapDirection {
    /// The order a channel at `current` moves to, or `None` at the boundary.
    pub fn target(self, current: i32, max_order: i32) -> Option<i32> {
        match self {
            Self::Up if current > 0 => Some(current - 1),
            Self::Down if current < max_order => Some(current + 1),
            _ => None,
        }
    }
}

/// Result of a swap that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwapOutcome {
    Swapped {
        channel_id: DbId,
        new_order: i32,
        partner_id: DbId,
        partner_order: i32,
    },
    /// Already first (moving up) or last (moving down). Nothing was written.
    AtBoundary,
}

/// Result of a demote that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DemoteOutcome {
    /// The rank was removed and `shifted` later channels moved up one slot.
    Compacted { removed_order: i32, shifted: u64 },
    /// The channel was flagged as highlighted without an order. Flags were
    /// cleared, no other channel was touched.
    ClearedWithoutCompaction,
}

/// Boxed failure from the underlying store.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Channel {0} not found")]
    ChannelNotFound(DbId),

    #[error("Channel {0} is not highlighted")]
    NotHighlighted(DbId),

    #[error("Channel {channel_id} is already highlighted at order {order}")]
    AlreadyHighlighted { channel_id: DbId, order: i32 },

    #[error("No highlighted channel holds order {order}")]
    MissingPartner { order: i32 },

    #[error("Channel {channel_id} no longer holds order {expected:?}")]
    StaleOrder {
        channel_id: DbId,
        expected: Option<i32>,
    },

    #[error("Store error: {0}")]
    Store(#[source] StoreError),
}

impl HighlightError {
    pub fn store(err: impl Into<StoreError>) -> Self {
        Self::Store(err.into())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Read/write access to the channel collection used by the highlight
/// operations.
pub trait HighlightStore: Send {
    /// Load one channel's highlight fields.
    fn find_rank(
        &mut self,
        channel_id: DbId,
    ) -> impl Future<Output = Result<Option<HighlightRank>, HighlightError>> + Send;

    /// Largest `highlight_order` among highlighted channels.
    fn max_order(&mut self) -> impl Future<Output = Result<Option<i32>, HighlightError>> + Send;

    /// The highlighted channel currently holding `order`.
    fn find_by_order(
        &mut self,
        order: i32,
    ) -> impl Future<Output = Result<Option<DbId>, HighlightError>> + Send;

    /// Set `highlight_order = new_order` and `is_highlight = new_order.is_some()`,
    /// but only if the row's order still equals `expected` (`None` matching
    /// `NULL`). Returns `false` when no row matched.
    fn write_rank(
        &mut self,
        channel_id: DbId,
        expected: Option<i32>,
        new_order: Option<i32>,
    ) -> impl Future<Output = Result<bool, HighlightError>> + Send;

    /// Decrement every highlighted order greater than `removed`. Returns the
    /// number of channels moved.
    fn shift_down_after(
        &mut self,
        removed: i32,
    ) -> impl Future<Output = Result<u64, HighlightError>> + Send;
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

async fn load_rank<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
) -> Result<HighlightRank, HighlightError> {
    store
        .find_rank(channel_id)
        .await?
        .ok_or(HighlightError::ChannelNotFound(channel_id))
}

async fn write_expected<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
    expected: Option<i32>,
    new_order: Option<i32>,
) -> Result<(), HighlightError> {
    if store.write_rank(channel_id, expected, new_order).await? {
        Ok(())
    } else {
        Err(HighlightError::StaleOrder {
            channel_id,
            expected,
        })
    }
}

/// Highlight a channel, appending it after the current last rank.
///
/// Returns the assigned order (0 when nothing was highlighted).
pub async fn promote<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
) -> Result<i32, HighlightError> {
    let rank = load_rank(store, channel_id).await?;
    if let Some(order) = rank.highlight_order {
        return Err(HighlightError::AlreadyHighlighted { channel_id, order });
    }

    let new_order = store.max_order().await?.map_or(0, |max| max + 1);
    write_expected(store, channel_id, None, Some(new_order)).await?;

    tracing::debug!(channel_id, order = new_order, "Channel promoted to highlights");
    Ok(new_order)
}

/// Remove a channel from the highlights and close the gap it leaves.
pub async fn demote<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
) -> Result<DemoteOutcome, HighlightError> {
    let rank = load_rank(store, channel_id).await?;

    match rank.highlight_order {
        None if !rank.is_highlight => Err(HighlightError::NotHighlighted(channel_id)),
        None => {
            write_expected(store, channel_id, None, None).await?;
            tracing::warn!(
                channel_id,
                "Highlighted channel had no order; cleared flags without compaction"
            );
            Ok(DemoteOutcome::ClearedWithoutCompaction)
        }
        Some(removed) => {
            write_expected(store, channel_id, Some(removed), None).await?;
            let shifted = store.shift_down_after(removed).await?;
            tracing::debug!(channel_id, removed, shifted, "Channel demoted from highlights");
            Ok(DemoteOutcome::Compacted {
                removed_order: removed,
                shifted,
            })
        }
    }
}

/// Exchange the channel at `current_order` with its neighbour in `direction`.
///
/// `max_order` is the caller's view of the last rank. Moving past either end
/// returns [`SwapOutcome::AtBoundary`] without touching the store. A missing
/// neighbour means the order table has a gap and is reported as
/// [`HighlightError::MissingPartner`] before anything is written.
pub async fn swap<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
    current_order: i32,
    direction: SwapDirection,
    max_order: i32,
) -> Result<SwapOutcome, HighlightError> {
    let Some(new_order) = direction.target(current_order, max_order) else {
        return Ok(SwapOutcome::AtBoundary);
    };

    let partner_id = match store.find_by_order(new_order).await? {
        Some(id) if id != channel_id => id,
        _ => {
            tracing::warn!(channel_id, order = new_order, "Swap partner missing");
            return Err(HighlightError::MissingPartner { order: new_order });
        }
    };

    write_expected(store, channel_id, Some(current_order), Some(new_order)).await?;
    write_expected(store, partner_id, Some(new_order), Some(current_order)).await?;

    tracing::debug!(
        channel_id,
        partner_id,
        from = current_order,
        to = new_order,
        "Highlight orders swapped"
    );
    Ok(SwapOutcome::Swapped {
        channel_id,
        new_order,
        partner_id,
        partner_order: current_order,
    })
}

async fn swap_step<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
    direction: SwapDirection,
) -> Result<SwapOutcome, HighlightError> {
    let rank = load_rank(store, channel_id).await?;
    let current = rank
        .highlight_order
        .filter(|_| rank.is_highlight)
        .ok_or(HighlightError::NotHighlighted(channel_id))?;
    let max_order = store.max_order().await?.unwrap_or(current);
    swap(store, channel_id, current, direction, max_order).await
}

/// Move a highlighted channel one slot towards the top.
pub async fn swap_up<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
) -> Result<SwapOutcome, HighlightError> {
    swap_step(store, channel_id, SwapDirection::Up).await
}

/// Move a highlighted channel one slot towards the bottom.
pub async fn swap_down<S: HighlightStore>(
    store: &mut S,
    channel_id: DbId,
) -> Result<SwapOutcome, HighlightError> {
    swap_step(store, channel_id, SwapDirection::Down).await
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

/// First defect found in a set of highlight orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "order", rename_all = "snake_case")]
pub enum OrderViolation {
    #[error("Order {0} is negative")]
    Negative(i32),

    #[error("Order {0} is held by more than one channel")]
    Duplicate(i32),

    #[error("Order {0} is missing")]
    Gap(i32),
}

/// Check that `orders` is exactly `0..N` in some arrangement.
///
/// Reports the lowest offending order. Does not modify anything.
pub fn check_dense(orders: impl IntoIterator<Item = i32>) -> Result<(), OrderViolation> {
    let mut sorted: Vec<i32> = orders.into_iter().collect();
    sorted.sort_unstable();

    let mut expected = 0;
    for order in sorted {
        if order < 0 {
            return Err(OrderViolation::Negative(order));
        }
        if order < expected {
            return Err(OrderViolation::Duplicate(order));
        }
        if order > expected {
            return Err(OrderViolation::Gap(expected));
        }
        expected += 1;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
