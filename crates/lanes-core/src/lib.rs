//! lanes-core: the board reordering engine.
//!
//! Work items live in status buckets (board columns). Within each status,
//! positions are dense and zero-based. Every mutation goes through an
//! [`ItemStore`] snapshot swap, so readers never see a half-applied move.
//!
//! Gesture flow: a drop event becomes a [`MoveInstruction`] through
//! [`resolve_drop`], the [`ReorderEngine`] commits the renumbered set, and
//! the [`PartitionView`] is what front ends render from. [`Board`] ties these
//! together for callers that want one handle.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per concern, each mapped to an [`ErrorCode`].
//! - **Logging**: `tracing` macros only; subscribers are installed by binaries.

pub mod board;
pub mod changeset;
pub mod config;
pub mod error;
pub mod intent;
pub mod lock;
pub mod model;
pub mod partition;
pub mod reorder;
pub mod store;

pub use board::{Board, MoveReport};
pub use changeset::{ChangeSink, ItemChange, Placement};
pub use error::{BoardError, ConfigError, ErrorCode, ValidationError};
pub use intent::{DropTarget, resolve_drop};
pub use model::{ItemId, NewItem, StatusKey, StatusSet, WorkItem};
pub use partition::{Column, PartitionView};
pub use reorder::{MoveInstruction, ReorderEngine};
pub use store::{ItemStore, WriteGuard};
