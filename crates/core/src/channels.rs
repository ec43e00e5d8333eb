//! Channel categories and default-channel selection.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Valid values for `channels.category`.
pub const VALID_CATEGORIES: &[&str] = &[
    "tech",
    "music",
    "documentary",
    "comedy",
    "gaming",
    "art",
    "science",
    "news",
];

/// Topic a channel is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCategory {
    Tech,
    Music,
    Documentary,
    Comedy,
    Gaming,
    Art,
    Science,
    News,
}

impl ChannelCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tech => "tech",
            Self::Music => "music",
            Self::Documentary => "documentary",
            Self::Comedy => "comedy",
            Self::Gaming => "gaming",
            Self::Art => "art",
            Self::Science => "science",
            Self::News => "news",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "tech" => Ok(Self::Tech),
            "music" => Ok(Self::Music),
            "documentary" => Ok(Self::Documentary),
            "comedy" => Ok(Self::Comedy),
            "gaming" => Ok(Self::Gaming),
            "art" => Ok(Self::Art),
            "science" => Ok(Self::Science),
            "news" => Ok(Self::News),
            _ => Err(CoreError::Validation(format!(
                "Invalid category '{s}'. Must be one of: {}",
                VALID_CATEGORIES.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Default channel
// ---------------------------------------------------------------------------

/// The channel fields needed to choose what a new viewer tunes into.
pub trait ChannelListing {
    fn is_public(&self) -> bool;
    fn is_highlight(&self) -> bool;
    fn highlight_order(&self) -> Option<i32>;
    fn created_at(&self) -> Timestamp;
}

/// Pick the channel a viewer lands on when they have not chosen one.
///
/// The top highlighted public channel wins (highlighted rows missing an order
/// sort after the ranked ones). Without highlights, the oldest public channel
/// is used.
pub fn pick_default_channel<T: ChannelListing>(channels: &[T]) -> Option<&T> {
    let public = || channels.iter().filter(|c| c.is_public());

    public()
        .filter(|c| c.is_highlight())
        .min_by_key(|c| (c.highlight_order().is_none(), c.highlight_order(), c.created_at()))
        .or_else(|| public().min_by_key(|c| c.created_at()))
}
