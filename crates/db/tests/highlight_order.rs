//! Integration tests for the transactional highlight ranking.
//!
//! Exercises `HighlightRepo` against a real database to verify that:
//! - Promote appends after the current maximum
//! - Demote compacts later ranks so the orders stay dense
//! - Swaps exchange neighbours and decline at the boundaries
//! - A stale caller view fails without writing anything
//!
//! Requires a Postgres reachable through `DATABASE_URL`.

use assert_matches::assert_matches;
use chrono::Utc;
use handpicked_core::highlight::{DemoteOutcome, HighlightError, SwapDirection, SwapOutcome};
use handpicked_core::types::DbId;
use handpicked_db::models::channel::CreateChannel;
use handpicked_db::repositories::{ChannelRepo, HighlightRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_channel(pool: &PgPool, slug: &str) -> DbId {
    let input = CreateChannel {
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        description: None,
        category: None,
        is_public: None,
    };
    ChannelRepo::create(pool, &input, Utc::now())
        .await
        .unwrap()
        .id
}

async fn ranking(pool: &PgPool) -> Vec<(DbId, Option<i32>)> {
    ChannelRepo::list_highlighted(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.highlight_order))
        .collect()
}

async fn highlighted(pool: &PgPool, count: usize) -> Vec<DbId> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let id = new_channel(pool, &format!("channel-{i}")).await;
        HighlightRepo::promote(pool, id).await.unwrap();
        ids.push(id);
    }
    ids
}

// ---------------------------------------------------------------------------
// Promote / demote
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_appends_in_order(pool: PgPool) {
    let ids = highlighted(&pool, 3).await;

    assert_eq!(
        ranking(&pool).await,
        vec![(ids[0], Some(0)), (ids[1], Some(1)), (ids[2], Some(2))]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_demote_compacts_ranks(pool: PgPool) {
    let ids = highlighted(&pool, 4).await;

    let outcome = HighlightRepo::demote(&pool, ids[1]).await.unwrap();
    assert_eq!(
        outcome,
        DemoteOutcome::Compacted {
            removed_order: 1,
            shifted: 2
        }
    );

    assert_eq!(
        ranking(&pool).await,
        vec![(ids[0], Some(0)), (ids[2], Some(1)), (ids[3], Some(2))]
    );
    assert_matches!(HighlightRepo::audit(&pool).await.unwrap(), Ok(()));

    let demoted = ChannelRepo::find_by_id(&pool, ids[1]).await.unwrap().unwrap();
    assert!(!demoted.is_highlight);
    assert_eq!(demoted.highlight_order, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_demote_of_plain_channel_is_reported(pool: PgPool) {
    let id = new_channel(&pool, "plain").await;
    let err = HighlightRepo::demote(&pool, id).await.unwrap_err();
    assert_matches!(err, HighlightError::NotHighlighted(_));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promote_twice_is_rejected(pool: PgPool) {
    let ids = highlighted(&pool, 1).await;
    let err = HighlightRepo::promote(&pool, ids[0]).await.unwrap_err();
    assert_matches!(err, HighlightError::AlreadyHighlighted { order: 0, .. });
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_promotes_get_distinct_orders(pool: PgPool) {
    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(new_channel(&pool, &format!("race-{i}")).await);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let pool = pool.clone();
            tokio::spawn(async move { HighlightRepo::promote(&pool, id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_matches!(HighlightRepo::audit(&pool).await.unwrap(), Ok(()));
    assert_eq!(ranking(&pool).await.len(), 6);
}

// ---------------------------------------------------------------------------
// Swap
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_swap_up_and_down_restore_order(pool: PgPool) {
    let ids = highlighted(&pool, 3).await;
    let before = ranking(&pool).await;

    let outcome = HighlightRepo::swap_up(&pool, ids[2]).await.unwrap();
    assert_matches!(outcome, SwapOutcome::Swapped { new_order: 1, .. });
    assert_eq!(
        ranking(&pool).await,
        vec![(ids[0], Some(0)), (ids[2], Some(1)), (ids[1], Some(2))]
    );

    HighlightRepo::swap_down(&pool, ids[2]).await.unwrap();
    assert_eq!(ranking(&pool).await, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_swap_at_boundaries_is_declined(pool: PgPool) {
    let ids = highlighted(&pool, 2).await;

    assert_eq!(
        HighlightRepo::swap_up(&pool, ids[0]).await.unwrap(),
        SwapOutcome::AtBoundary
    );
    assert_eq!(
        HighlightRepo::swap_down(&pool, ids[1]).await.unwrap(),
        SwapOutcome::AtBoundary
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_stale_swap_writes_nothing(pool: PgPool) {
    let ids = highlighted(&pool, 3).await;
    let before = ranking(&pool).await;

    // The caller still thinks the first channel sits at order 2.
    let err = HighlightRepo::swap(&pool, ids[0], 2, SwapDirection::Up, 2)
        .await
        .unwrap_err();
    assert_matches!(err, HighlightError::StaleOrder { .. });
    assert_eq!(ranking(&pool).await, before);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_highlighted_channel_cannot_be_deleted(pool: PgPool) {
    let ids = highlighted(&pool, 1).await;
    assert!(!ChannelRepo::delete(&pool, ids[0]).await.unwrap());

    HighlightRepo::demote(&pool, ids[0]).await.unwrap();
    assert!(ChannelRepo::delete(&pool, ids[0]).await.unwrap());
}
