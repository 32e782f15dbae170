use std::fmt;

use lanes_core::{BoardError, ItemId, MoveReport, StatusKey};
use serde::{Deserialize, Serialize};

/// One simulated user action against the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    /// Drag `dragged` and release it over `target`.
    DropOnItem { dragged: ItemId, target: ItemId },
    /// Drag `dragged` and release it over the column body of `status`.
    DropOnColumn { dragged: ItemId, status: StatusKey },
    /// Drag `dragged` and release it outside any column.
    Miss { dragged: ItemId },
    /// Direct move instruction, bypassing drop resolution.
    Move {
        item: ItemId,
        status: StatusKey,
        index: usize,
    },
    Create { id: ItemId, status: StatusKey },
    Remove { id: ItemId },
}

impl Gesture {
    /// The item the gesture acts on.
    #[must_use]
    pub const fn subject(&self) -> &ItemId {
        match self {
            Self::DropOnItem { dragged, .. }
            | Self::DropOnColumn { dragged, .. }
            | Self::Miss { dragged } => dragged,
            Self::Move { item, .. } => item,
            Self::Create { id, .. } | Self::Remove { id } => id,
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropOnItem { dragged, target } => write!(f, "drop {dragged} on {target}"),
            Self::DropOnColumn { dragged, status } => write!(f, "drop {dragged} on column {status}"),
            Self::Miss { dragged } => write!(f, "drop {dragged} outside the board"),
            Self::Move {
                item,
                status,
                index,
            } => write!(f, "move {item} to {status}[{index}]"),
            Self::Create { id, status } => write!(f, "create {id} in {status}"),
            Self::Remove { id } => write!(f, "remove {id}"),
        }
    }
}

/// What the board did with a gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Committed; `changes` placements differ from before.
    Applied { changes: usize },
    /// Resolved to nothing (a miss or an unknown hover target).
    Discarded,
    /// Refused with the given error code.
    Rejected { code: String },
}

impl Outcome {
    pub(crate) fn from_report(result: Result<MoveReport, BoardError>) -> Self {
        match result {
            Ok(report) => Self::Applied {
                changes: report.changes.len(),
            },
            Err(err) => Self::rejected(&err),
        }
    }

    pub(crate) fn rejected(err: &BoardError) -> Self {
        Self::Rejected {
            code: err.code().code().to_string(),
        }
    }

    /// True for a commit that changed no placement.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Applied { changes: 0 })
    }
}
