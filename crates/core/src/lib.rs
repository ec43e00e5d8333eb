//! Domain logic for always-on video channels.
//!
//! Everything in this crate is free of I/O. Callers load schedules,
//! timelines and channel rows from the store, pass them in together with
//! the current instant, and act on the result.

pub mod channels;
pub mod error;
pub mod highlight;
pub mod player;
pub mod schedule;
pub mod types;
pub mod video_ref;
