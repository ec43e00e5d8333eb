//! Channel timeline model: the anchor instant of a channel's loop.

use handpicked_core::schedule::LoopAnchor;
use handpicked_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `channel_timelines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChannelTimeline {
    pub channel_id: DbId,
    pub start_time: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChannelTimeline {
    pub fn anchor(&self) -> LoopAnchor {
        LoopAnchor {
            channel_id: self.channel_id,
            start_time: self.start_time,
        }
    }
}
