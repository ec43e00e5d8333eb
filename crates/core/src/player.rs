//! Embedded player states and playback-failure policy.
//!
//! The player is a sink: it is told which video to play at which offset and
//! reports numeric state changes and error codes back. Only errors meaning
//! the video itself is unavailable may disable a schedule item.

use serde::Serialize;

use crate::error::CoreError;
use crate::schedule::{next_playable, Playable};

// ---------------------------------------------------------------------------
// Player states
// ---------------------------------------------------------------------------

/// State codes reported by the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Unstarted => -1,
            Self::Ended => 0,
            Self::Playing => 1,
            Self::Paused => 2,
            Self::Buffering => 3,
            Self::Cued => 5,
        }
    }

    /// The current video finished on its own; time to advance.
    pub fn is_ended(self) -> bool {
        self == Self::Ended
    }
}

/// The item to switch to after the player reported `state` while playing
/// `items[current_index]`. Only a naturally ended video advances.
pub fn advance_on<T: Playable>(
    state: PlayerState,
    items: &[T],
    current_index: usize,
) -> Option<(usize, &T)> {
    if state.is_ended() {
        next_playable(items, current_index)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Playback failures
// ---------------------------------------------------------------------------

/// Player error codes meaning the video cannot be played anywhere
/// (not found, private, or embedding disabled).
pub const UNAVAILABLE_ERROR_CODES: &[i32] = &[100, 101, 150, 153];

/// Maximum stored length of a reported error message.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Check that a reported error code is one that may disable an item.
pub fn validate_disable_code(code: i32) -> Result<(), CoreError> {
    if UNAVAILABLE_ERROR_CODES.contains(&code) {
        Ok(())
    } else {
        let allowed: Vec<String> = UNAVAILABLE_ERROR_CODES
            .iter()
            .map(ToString::to_string)
            .collect();
        Err(CoreError::Validation(format!(
            "Invalid error code {code}. Allowed: {}",
            allowed.join(", ")
        )))
    }
}

/// The message stored with a failure report: the reporter's text when given,
/// otherwise a generic one naming the code. Trimmed and capped in length.
pub fn failure_message(code: i32, reported: Option<&str>) -> String {
    let message = reported
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map_or_else(|| format!("YouTube error {code}"), str::to_string);
    message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}
