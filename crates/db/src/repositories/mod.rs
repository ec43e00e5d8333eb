//! Query layer over the channel tables.
//!
//! Repositories are unit structs whose async methods take `&PgPool` first.
//! Highlight columns are only written through [`HighlightRepo`].

pub mod channel_repo;
pub mod highlight_repo;
pub mod schedule_item_repo;
pub mod timeline_repo;

pub use channel_repo::ChannelRepo;
pub use highlight_repo::{HighlightRepo, PgHighlightStore};
pub use schedule_item_repo::ScheduleItemRepo;
pub use timeline_repo::TimelineRepo;
