//! Channel entity model and DTOs.

use handpicked_core::channels::{ChannelCategory, ChannelListing};
use handpicked_core::error::CoreError;
use handpicked_core::highlight::HighlightRank;
use handpicked_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `channels` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Channel {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: bool,
    pub is_highlight: bool,
    pub highlight_order: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Channel {
    pub fn rank(&self) -> HighlightRank {
        HighlightRank {
            channel_id: self.id,
            is_highlight: self.is_highlight,
            highlight_order: self.highlight_order,
        }
    }
}

impl ChannelListing for Channel {
    fn is_public(&self) -> bool {
        self.is_public
    }

    fn is_highlight(&self) -> bool {
        self.is_highlight
    }

    fn highlight_order(&self) -> Option<i32> {
        self.highlight_order
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// DTO for creating a new channel. Highlight fields are managed separately.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChannel {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

/// DTO for updating an existing channel. All fields optional; slug is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChannel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
}

fn validate_category(category: Option<&str>) -> Result<(), CoreError> {
    category.map_or(Ok(()), |c| ChannelCategory::parse(c).map(|_| ()))
}

impl CreateChannel {
    /// Check fields the database would otherwise reject with a constraint error.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slug.trim().is_empty() {
            return Err(CoreError::Validation("slug must not be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("title must not be empty".to_string()));
        }
        validate_category(self.category.as_deref())
    }
}

impl UpdateChannel {
    pub fn validate(&self) -> Result<(), CoreError> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err(CoreError::Validation("title must not be empty".to_string()));
        }
        validate_category(self.category.as_deref())
    }
}
