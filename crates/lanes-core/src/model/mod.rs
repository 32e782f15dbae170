//! Board data model: items, identifiers and the configured status set.

pub mod item;
pub mod status;

pub use item::{ItemId, NewItem, WorkItem};
pub use status::{StatusKey, StatusSet};
