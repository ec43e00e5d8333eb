//! Wall-clock loop scheduling for channels.
//!
//! A channel plays its schedule on an endless loop anchored at the
//! timeline's `start_time`. Every function here is pure: the caller supplies
//! `now`, so any two viewers evaluating the same schedule and anchor at the
//! same instant land on the same item at the same offset.
//!
//! Disabled items stay in the slice so that indices keep referring to the
//! stored list. They are skipped for playback and excluded from the loop
//! length.

use serde::Serialize;

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A schedule entry as seen by the loop arithmetic.
pub trait Playable {
    /// Length of the video in whole seconds.
    fn duration_seconds(&self) -> i64;

    /// Soft-delete flag. Disabled items are kept but never played.
    fn is_disabled(&self) -> bool;

    fn is_playable(&self) -> bool {
        !self.is_disabled()
    }
}

/// The instant a channel's loop is considered to have started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoopAnchor {
    pub channel_id: DbId,
    pub start_time: Timestamp,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// An item found at some position inside the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Located<'a, T> {
    pub item: &'a T,
    /// Index in the original slice, disabled items included.
    pub index: usize,
    pub offset_seconds: i64,
}

/// What a channel is playing at a given instant. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState<'a, T> {
    pub channel_id: DbId,
    pub current_item: &'a T,
    /// Index in the original schedule, disabled items included.
    pub current_item_index: usize,
    /// Always within `0..current_item.duration_seconds()`.
    pub offset_seconds: i64,
    pub total_duration_seconds: i64,
}

impl<T: Playable> PlaybackState<'_, T> {
    /// Seconds left before the current item ends and the next one starts.
    pub fn remaining_seconds(&self) -> i64 {
        seconds_until_next(self.current_item, self.offset_seconds)
    }
}

// ---------------------------------------------------------------------------
// Schedule math
// ---------------------------------------------------------------------------

/// Length of one pass through the loop: the sum of playable durations.
///
/// Returns 0 for an empty or fully disabled schedule, which means there is
/// nothing to play.
pub fn total_duration<T: Playable>(items: &[T]) -> i64 {
    items
        .iter()
        .filter(|item| item.is_playable())
        .map(|item| item.duration_seconds().max(0))
        .sum()
}

fn first_playable<T: Playable>(items: &[T]) -> Option<Located<'_, T>> {
    items
        .iter()
        .enumerate()
        .find(|(_, item)| item.is_playable())
        .map(|(index, item)| Located {
            item,
            index,
            offset_seconds: 0,
        })
}

/// Find the playable item covering `position_in_loop`.
///
/// Expects `0 <= position_in_loop < total_duration(items)`. A position
/// outside that range falls back to the first playable item at offset 0.
/// Returns `None` only when nothing is playable.
pub fn locate<T: Playable>(items: &[T], position_in_loop: i64) -> Option<Located<'_, T>> {
    let mut start = 0;
    for (index, item) in items.iter().enumerate() {
        if !item.is_playable() {
            continue;
        }
        let end = start + item.duration_seconds().max(0);
        if position_in_loop >= start && position_in_loop < end {
            return Some(Located {
                item,
                index,
                offset_seconds: position_in_loop - start,
            });
        }
        start = end;
    }
    first_playable(items)
}

/// Whole seconds elapsed since `start_time`, rounded toward negative infinity.
pub fn elapsed_seconds(start_time: Timestamp, now: Timestamp) -> i64 {
    (now - start_time).num_milliseconds().div_euclid(1000)
}

// ---------------------------------------------------------------------------
// Playback state
// ---------------------------------------------------------------------------

/// Compute what `anchor`'s channel is playing at `now`.
///
/// Returns `None` when the schedule has nothing playable. Before the anchor
/// instant the channel shows its first playable item at offset 0.
pub fn calculate_playback_state<'a, T: Playable>(
    items: &'a [T],
    anchor: &LoopAnchor,
    now: Timestamp,
) -> Option<PlaybackState<'a, T>> {
    let total = total_duration(items);
    if total <= 0 {
        return None;
    }

    let elapsed = elapsed_seconds(anchor.start_time, now);
    let located = if elapsed < 0 {
        first_playable(items)?
    } else {
        locate(items, elapsed.rem_euclid(total))?
    };

    Some(PlaybackState {
        channel_id: anchor.channel_id,
        current_item: located.item,
        current_item_index: located.index,
        offset_seconds: located.offset_seconds,
        total_duration_seconds: total,
    })
}

/// Seconds left in `item` when playing at `offset_seconds`.
pub fn seconds_until_next<T: Playable>(item: &T, offset_seconds: i64) -> i64 {
    item.duration_seconds() - offset_seconds
}

// ---------------------------------------------------------------------------
// Next item
// ---------------------------------------------------------------------------

/// The next playable item after `current_index`, wrapping around the end.
///
/// Scans at most one full lap, so the current item itself is returned when it
/// is the only playable one. `current_index` may point at an item that was
/// disabled mid-playback or lie past the end of a shortened schedule.
pub fn next_playable<T: Playable>(items: &[T], current_index: usize) -> Option<(usize, &T)> {
    let len = items.len();
    if len == 0 {
        return None;
    }
    let from = current_index % len;
    (1..=len)
        .map(|step| (from + step) % len)
        .map(|index| (index, &items[index]))
        .find(|(_, item)| item.is_playable())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
