//! Row structs and input DTOs for channels, schedules and timelines.
//!
//! Rows derive `FromRow` + `Serialize`. Input DTOs derive `Deserialize` and
//! carry a `validate()` that runs the domain checks from `handpicked-core`
//! before anything reaches the database.

pub mod channel;
pub mod schedule_item;
pub mod timeline;
