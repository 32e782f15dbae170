//! Reorder engine: relocate one item and renumber the affected columns.
//!
//! # Move semantics
//!
//! `target_index` is an insertion index into the destination column as it
//! looks *after* the moving item has been taken out of its origin (plain
//! list-splice semantics). It is clamped to `[0, len]`, so an overshooting
//! drag lands at the nearest end instead of failing.
//!
//! Only the origin and destination columns are renumbered. Every other item
//! keeps its `(status, position)` pair, and the snapshot's vector order is
//! never changed, so moving an item onto its own slot commits a set that is
//! identical to the one before.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{BoardError, ValidationError};
use crate::model::{ItemId, StatusKey, StatusSet, WorkItem};
use crate::store::{ItemStore, Snapshot, WriteGuard};

/// Relocation request: put `item_id` into `target_status` at `target_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInstruction {
    pub item_id: ItemId,
    pub target_status: StatusKey,
    pub target_index: usize,
}

impl MoveInstruction {
    pub fn new(
        item_id: impl Into<ItemId>,
        target_status: impl Into<StatusKey>,
        target_index: usize,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            target_status: target_status.into(),
            target_index,
        }
    }
}

/// Result of planning a move without committing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    /// The full next item set.
    pub items: Vec<WorkItem>,
    /// Status the item left.
    pub origin: StatusKey,
    /// Index actually used after clamping.
    pub index: usize,
}

/// Snapshot slots of `status`, ordered by position then slot.
fn ordered_slots(items: &[WorkItem], status: &StatusKey) -> Vec<usize> {
    let mut slots: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| &item.status == status)
        .map(|(slot, _)| slot)
        .collect();
    slots.sort_by_key(|slot| (items[*slot].position, *slot));
    slots
}

fn renumber(items: &mut [WorkItem], slots: &[usize]) {
    for (position, slot) in slots.iter().enumerate() {
        items[*slot].position = position;
    }
}

/// Compute the item set that results from `instruction`.
///
/// # Errors
///
/// - [`BoardError::NotFound`] if no item has `instruction.item_id`.
/// - [`BoardError::InvalidStatus`] if the target status is not configured.
pub fn plan_move(
    items: &[WorkItem],
    statuses: &StatusSet,
    instruction: &MoveInstruction,
) -> Result<MovePlan, BoardError> {
    let moving = items
        .iter()
        .position(|item| item.id == instruction.item_id)
        .ok_or_else(|| BoardError::NotFound {
            id: instruction.item_id.clone(),
        })?;
    let target = &instruction.target_status;
    if !statuses.contains(target) {
        return Err(BoardError::InvalidStatus {
            status: target.clone(),
        });
    }

    let origin = items[moving].status.clone();
    let same_column = &origin == target;

    let origin_rest: Vec<usize> = ordered_slots(items, &origin)
        .into_iter()
        .filter(|slot| *slot != moving)
        .collect();
    let mut destination = if same_column {
        origin_rest.clone()
    } else {
        ordered_slots(items, target)
    };

    let index = instruction.target_index.min(destination.len());
    destination.insert(index, moving);

    let mut next = items.to_vec();
    next[moving].status = target.clone();
    if !same_column {
        renumber(&mut next, &origin_rest);
    }
    renumber(&mut next, &destination);

    Ok(MovePlan {
        items: next,
        origin,
        index,
    })
}

/// Renumber `status` densely, keeping its current relative order.
#[must_use]
pub fn compact_status(items: &[WorkItem], status: &StatusKey) -> Vec<WorkItem> {
    let slots = ordered_slots(items, status);
    let mut next = items.to_vec();
    renumber(&mut next, &slots);
    next
}

/// Renumber every status present in `items`.
#[must_use]
pub fn compact_all(items: &[WorkItem]) -> Vec<WorkItem> {
    let mut seen: Vec<&StatusKey> = Vec::new();
    for item in items {
        if !seen.contains(&&item.status) {
            seen.push(&item.status);
        }
    }

    let mut next = items.to_vec();
    for status in seen {
        let slots = ordered_slots(items, status);
        renumber(&mut next, &slots);
    }
    next
}

/// A committed change: the snapshot it replaced and the set now installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub before: Snapshot,
    pub after: Vec<WorkItem>,
}

/// Applies moves and compactions to an [`ItemStore`].
#[derive(Debug, Clone, Default)]
pub struct ReorderEngine {
    statuses: StatusSet,
}

impl ReorderEngine {
    #[must_use]
    pub const fn new(statuses: StatusSet) -> Self {
        Self { statuses }
    }

    #[must_use]
    pub const fn statuses(&self) -> &StatusSet {
        &self.statuses
    }

    /// Move one item and commit the renumbered set.
    ///
    /// Returns the committed item set.
    ///
    /// # Errors
    ///
    /// See [`plan_move`]. On error the store is unchanged.
    ///
    /// # Panics
    ///
    /// In debug builds, if the planned set fails store validation. Release
    /// builds log the failure; a set with gaps is committed fully compacted,
    /// a set with duplicate ids is refused with [`BoardError::Validation`].
    pub fn move_item(
        &self,
        store: &ItemStore,
        instruction: &MoveInstruction,
    ) -> Result<Vec<WorkItem>, BoardError> {
        self.transition(store, instruction).map(|t| t.after)
    }

    /// [`ReorderEngine::move_item`], also returning the replaced snapshot.
    ///
    /// # Errors
    ///
    /// See [`plan_move`].
    ///
    /// # Panics
    ///
    /// Same policy as [`ReorderEngine::move_item`].
    pub fn transition(
        &self,
        store: &ItemStore,
        instruction: &MoveInstruction,
    ) -> Result<Transition, BoardError> {
        let guard = store.lock_writes();
        self.transition_locked(store, &guard, instruction)
    }

    /// [`ReorderEngine::transition`] for a caller that already holds
    /// `store`'s writer lock, e.g. to resolve a gesture on the same snapshot
    /// the move is planned against.
    ///
    /// # Errors
    ///
    /// See [`plan_move`].
    ///
    /// # Panics
    ///
    /// If `guard` belongs to another store, and otherwise the same policy as
    /// [`ReorderEngine::move_item`].
    pub fn transition_locked(
        &self,
        store: &ItemStore,
        guard: &WriteGuard<'_>,
        instruction: &MoveInstruction,
    ) -> Result<Transition, BoardError> {
        assert!(guard.guards(store), "write guard taken from another store");
        let snapshot = store.snapshot();
        let plan = plan_move(&snapshot, &self.statuses, instruction)?;

        debug!(
            item = %instruction.item_id,
            from = %plan.origin,
            to = %instruction.target_status,
            requested = instruction.target_index,
            index = plan.index,
            "moving item"
        );

        let after = commit(store, plan.items)?;
        Ok(Transition {
            before: snapshot,
            after,
        })
    }

    /// Renumber one status after an out-of-band removal.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidStatus`] if `status` is not configured.
    ///
    /// # Panics
    ///
    /// Same policy as [`ReorderEngine::move_item`].
    pub fn compact(
        &self,
        store: &ItemStore,
        status: &StatusKey,
    ) -> Result<Transition, BoardError> {
        if !self.statuses.contains(status) {
            return Err(BoardError::InvalidStatus {
                status: status.clone(),
            });
        }
        let _guard = store.lock_writes();
        let snapshot = store.snapshot();
        debug!(%status, "compacting status");
        let after = commit(store, compact_status(&snapshot, status))?;
        Ok(Transition {
            before: snapshot,
            after,
        })
    }
}

/// Commit a set the engine computed itself.
///
/// A validation failure here is a logic fault in the engine, not bad input.
/// Debug builds panic. Release builds commit the fully compacted set when
/// only positions are off, and refuse a set with duplicate ids, leaving the
/// store as it was.
pub(crate) fn commit(store: &ItemStore, items: Vec<WorkItem>) -> Result<Vec<WorkItem>, BoardError> {
    let Err(err) = store.replace_all(items.clone()) else {
        return Ok(items);
    };
    match err {
        ValidationError::NotDense { .. } => {
            error!(
                %err,
                policy = "compact",
                "engine produced non-dense positions; committing compacted set"
            );
            debug_assert!(false, "engine produced an invalid item set: {err}");
            let repaired = compact_all(&items);
            store.replace_all(repaired.clone())?;
            Ok(repaired)
        }
        ValidationError::DuplicateId { .. } => {
            error!(
                %err,
                policy = "reject",
                "engine produced duplicate ids; store left unchanged"
            );
            debug_assert!(false, "engine produced an invalid item set: {err}");
            Err(err.into())
        }
    }
}
