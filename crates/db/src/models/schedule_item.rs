//! Schedule item entity model and DTOs.
//!
//! A schedule item is one video in a channel's loop. `position` fixes the
//! base order. Items are disabled rather than removed when the player
//! reports them unavailable.

use handpicked_core::error::CoreError;
use handpicked_core::player::{failure_message, validate_disable_code};
use handpicked_core::schedule::Playable;
use handpicked_core::types::{DbId, Timestamp};
use handpicked_core::video_ref::{
    catalog_duration_seconds, require_video_id, validate_duration_seconds,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `channel_schedules` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ScheduleItem {
    pub id: DbId,
    pub channel_id: DbId,
    pub position: i32,
    pub youtube_video_id: String,
    pub title: Option<String>,
    pub duration_seconds: i32,
    pub is_disabled: bool,
    pub last_error_code: Option<i32>,
    pub last_error_message: Option<String>,
    pub last_checked_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Playable for ScheduleItem {
    fn duration_seconds(&self) -> i64 {
        i64::from(self.duration_seconds)
    }

    fn is_disabled(&self) -> bool {
        self.is_disabled
    }
}

/// DTO for adding a video to a channel's schedule.
///
/// `video` accepts a bare id or a watch/share URL. The length comes either
/// as whole seconds or as the catalog's ISO 8601 string (`PT4M13S`); an
/// explicit `duration_seconds` wins. When `position` is absent the item is
/// appended after the current last position.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleItem {
    pub channel_id: DbId,
    pub position: Option<i32>,
    pub video: String,
    pub title: Option<String>,
    pub duration_seconds: Option<i32>,
    pub duration: Option<String>,
}

/// Normalized values of a [`CreateScheduleItem`], ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduleItem {
    pub video_id: String,
    pub duration_seconds: i32,
}

impl CreateScheduleItem {
    /// Validate the input and resolve the video id and length.
    pub fn validate(&self) -> Result<NewScheduleItem, CoreError> {
        if let Some(position) = self.position {
            if position < 0 {
                return Err(CoreError::Validation(format!(
                    "position must be >= 0, got {position}"
                )));
            }
        }
        let duration_seconds = match (self.duration_seconds, self.duration.as_deref()) {
            (Some(seconds), _) => {
                validate_duration_seconds(seconds)?;
                seconds
            }
            (None, Some(iso)) => catalog_duration_seconds(iso)?,
            (None, None) => {
                return Err(CoreError::Validation(
                    "either duration_seconds or duration is required".to_string(),
                ))
            }
        };
        Ok(NewScheduleItem {
            video_id: require_video_id(&self.video)?,
            duration_seconds,
        })
    }
}

/// A playback failure reported by a viewer's player.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackFailureReport {
    pub schedule_item_id: DbId,
    pub error_code: i32,
    pub error_message: Option<String>,
}

impl PlaybackFailureReport {
    /// Validate the code and return the message to store.
    pub fn validate(&self) -> Result<String, CoreError> {
        validate_disable_code(self.error_code)?;
        Ok(failure_message(
            self.error_code,
            self.error_message.as_deref(),
        ))
    }
}
