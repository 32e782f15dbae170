//! Translate drop gestures into move instructions.
//!
//! Dropping onto a card always inserts the dragged card immediately *before*
//! the hovered one. The index handed to the engine is the hovered card's
//! index in the destination column with the dragged card already removed,
//! which keeps "before" true for downward drags within one column too.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ItemId, StatusKey, WorkItem};
use crate::partition::column;
use crate::reorder::MoveInstruction;

/// Where a drag gesture ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum DropTarget {
    /// Released over another card.
    Item(ItemId),
    /// Released over a column's empty area or drop marker.
    EmptyColumn(StatusKey),
    /// Released over nothing droppable.
    Miss,
}

/// Resolve a drop into a move instruction, or `None` to discard the gesture.
///
/// A missing `dragged` item still resolves so the engine can report it; a
/// missing hovered item is treated as a miss.
#[must_use]
pub fn resolve_drop(
    items: &[WorkItem],
    dragged: &ItemId,
    target: &DropTarget,
) -> Option<MoveInstruction> {
    match target {
        DropTarget::Miss => {
            debug!(item = %dragged, "drop missed every target");
            None
        }
        DropTarget::EmptyColumn(status) => Some(MoveInstruction {
            item_id: dragged.clone(),
            target_status: status.clone(),
            target_index: column(items, status).len(),
        }),
        DropTarget::Item(hovered) => {
            let Some(over) = items.iter().find(|i| &i.id == hovered) else {
                debug!(item = %dragged, %hovered, "drop onto unknown item");
                return None;
            };

            if hovered == dragged {
                return Some(MoveInstruction {
                    item_id: dragged.clone(),
                    target_status: over.status.clone(),
                    target_index: over.position,
                });
            }

            let index = column(items, &over.status)
                .into_iter()
                .filter(|i| &i.id != dragged)
                .position(|i| &i.id == hovered)?;

            Some(MoveInstruction {
                item_id: dragged.clone(),
                target_status: over.status.clone(),
                target_index: index,
            })
        }
    }
}
