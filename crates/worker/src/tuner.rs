//! Periodic "now playing" evaluation of every public channel.
//!
//! On each tick the tuner loads the public channels with their timelines and
//! schedules, computes what each one is playing at the current instant, and
//! decides whether the next item should be pre-loaded. It holds no playback
//! state of its own beyond the last item it reported per channel, which only
//! serves to log transitions.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use handpicked_core::schedule::{calculate_playback_state, next_playable, LoopAnchor, Playable};
use handpicked_core::types::{DbId, Timestamp};
use handpicked_db::models::schedule_item::ScheduleItem;
use handpicked_db::repositories::{ChannelRepo, ScheduleItemRepo, TimelineRepo};
use handpicked_db::DbPool;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// What a channel should show at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TunePlan {
    pub current_index: usize,
    pub offset_seconds: i64,
    pub remaining_seconds: i64,
    /// Index of the item to pre-load, once the current one is about to end.
    pub preload_index: Option<usize>,
}

/// Decide what `anchor`'s channel plays at `now`.
///
/// Returns `None` for a channel with nothing playable.
pub fn plan_channel<T: Playable>(
    items: &[T],
    anchor: &LoopAnchor,
    now: Timestamp,
    preload_window_secs: i64,
) -> Option<TunePlan> {
    let state = calculate_playback_state(items, anchor, now)?;
    let remaining_seconds = state.remaining_seconds();

    let preload_index = if remaining_seconds <= preload_window_secs {
        next_playable(items, state.current_item_index).map(|(index, _)| index)
    } else {
        None
    };

    Some(TunePlan {
        current_index: state.current_item_index,
        offset_seconds: state.offset_seconds,
        remaining_seconds,
        preload_index,
    })
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// How the item a channel plays changed since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Advanced { from: DbId },
    Unchanged,
}

/// Last schedule item reported per channel.
#[derive(Debug, Default)]
pub struct NowPlaying {
    items: HashMap<DbId, DbId>,
}

impl NowPlaying {
    /// Record that `channel_id` plays `schedule_item_id` now.
    pub fn record(&mut self, channel_id: DbId, schedule_item_id: DbId) -> Transition {
        match self.items.insert(channel_id, schedule_item_id) {
            None => Transition::Started,
            Some(previous) if previous == schedule_item_id => Transition::Unchanged,
            Some(previous) => Transition::Advanced { from: previous },
        }
    }

    /// Forget a channel that stopped playing. Returns whether it was playing.
    pub fn clear(&mut self, channel_id: DbId) -> bool {
        self.items.remove(&channel_id).is_some()
    }

    /// Drop every channel not in `live`.
    pub fn retain_channels(&mut self, live: impl Fn(DbId) -> bool) {
        self.items.retain(|channel_id, _| live(*channel_id));
    }
}

// ---------------------------------------------------------------------------
// Tuner
// ---------------------------------------------------------------------------

/// Counters for one tick, logged at the end of it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub playing: usize,
    pub idle: usize,
    pub preloading: usize,
    pub failed: usize,
}

pub struct Tuner {
    pool: DbPool,
    preload_window_secs: i64,
    now_playing: NowPlaying,
}

impl Tuner {
    pub fn new(pool: DbPool, preload_window_secs: i64) -> Self {
        Self {
            pool,
            preload_window_secs,
            now_playing: NowPlaying::default(),
        }
    }

    /// Run the tuner loop until `cancel` is triggered.
    pub async fn run(mut self, tick_interval: Duration, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = tick_interval.as_secs(),
            preload_window_secs = self.preload_window_secs,
            "Tuner started"
        );

        let mut interval = tokio::time::interval(tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Tuner stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.tick(Utc::now()).await {
                        Ok(summary) => {
                            tracing::debug!(
                                playing = summary.playing,
                                idle = summary.idle,
                                preloading = summary.preloading,
                                failed = summary.failed,
                                "Tuner tick complete"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Tuner tick failed");
                        }
                    }
                }
            }
        }
    }

    /// Evaluate every public channel at `now`.
    ///
    /// A channel whose schedule cannot be loaded is logged and counted as
    /// failed; the remaining channels are still evaluated.
    pub async fn tick(&mut self, now: Timestamp) -> Result<TickSummary, sqlx::Error> {
        let channels = ChannelRepo::list_public(&self.pool).await?;
        let ids: Vec<DbId> = channels.iter().map(|c| c.id).collect();
        let anchors: HashMap<DbId, LoopAnchor> = TimelineRepo::list_for_channels(&self.pool, &ids)
            .await?
            .into_iter()
            .map(|t| (t.channel_id, t.anchor()))
            .collect();

        let mut summary = TickSummary::default();
        for channel in &channels {
            let Some(anchor) = anchors.get(&channel.id) else {
                tracing::warn!(
                    channel_id = channel.id,
                    slug = %channel.slug,
                    "Channel has no timeline"
                );
                summary.idle += 1;
                continue;
            };

            let items = match ScheduleItemRepo::list_for_channel(&self.pool, channel.id).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!(
                        channel_id = channel.id,
                        error = %e,
                        "Failed to load channel schedule"
                    );
                    summary.failed += 1;
                    continue;
                }
            };
            match plan_channel(&items, anchor, now, self.preload_window_secs) {
                Some(plan) => {
                    summary.playing += 1;
                    if plan.preload_index.is_some() {
                        summary.preloading += 1;
                    }
                    self.report(channel.id, &items, &plan);
                }
                None => {
                    summary.idle += 1;
                    if self.now_playing.clear(channel.id) {
                        tracing::info!(channel_id = channel.id, "Channel has nothing left to play");
                    } else {
                        tracing::debug!(channel_id = channel.id, "Channel has no playable items");
                    }
                }
            }
        }

        self.now_playing.retain_channels(|id| anchors.contains_key(&id));
        Ok(summary)
    }

    fn report(&mut self, channel_id: DbId, items: &[ScheduleItem], plan: &TunePlan) {
        let current = &items[plan.current_index];

        match self.now_playing.record(channel_id, current.id) {
            Transition::Unchanged => {
                tracing::trace!(
                    channel_id,
                    schedule_item_id = current.id,
                    offset_seconds = plan.offset_seconds,
                    remaining_seconds = plan.remaining_seconds,
                    "Still playing"
                );
            }
            transition => {
                let previous_item_id = match transition {
                    Transition::Advanced { from } => Some(from),
                    _ => None,
                };
                tracing::info!(
                    channel_id,
                    schedule_item_id = current.id,
                    ?previous_item_id,
                    video_id = %current.youtube_video_id,
                    index = plan.current_index,
                    offset_seconds = plan.offset_seconds,
                    "Now playing"
                );
            }
        }

        if let Some(next) = plan.preload_index.map(|i| &items[i]) {
            tracing::debug!(
                channel_id,
                schedule_item_id = next.id,
                video_id = %next.youtube_video_id,
                remaining_seconds = plan.remaining_seconds,
                "Pre-loading next item"
            );
        }
    }
}
