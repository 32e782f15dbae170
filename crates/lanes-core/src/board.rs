//! Board controller: the single owner of a store and its engine.
//!
//! Front ends hold one [`Board`] and route every gesture, creation and
//! removal through it. After each successful commit the placement diff is
//! offered to the optional [`ChangeSink`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::changeset::{self, ChangeSink, ItemChange};
use crate::error::{BoardError, ValidationError};
use crate::intent::{DropTarget, resolve_drop};
use crate::model::{ItemId, NewItem, StatusKey, StatusSet, WorkItem};
use crate::partition::{PartitionView, column};
use crate::reorder::{self, MoveInstruction, ReorderEngine};
use crate::store::{self, ItemStore, Snapshot};

/// Committed item set plus what changed to get there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    pub items: Vec<WorkItem>,
    pub changes: Vec<ItemChange>,
}

impl MoveReport {
    /// True when the commit left every placement as it was.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

pub struct Board {
    store: ItemStore,
    engine: ReorderEngine,
    sink: Option<Box<dyn ChangeSink>>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("statuses", self.engine.statuses())
            .field("items", &self.store.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Board {
    /// Empty board with the given columns.
    #[must_use]
    pub fn new(statuses: StatusSet) -> Self {
        Self {
            store: ItemStore::new(),
            engine: ReorderEngine::new(statuses),
            sink: None,
        }
    }

    /// Attach a sink that receives every committed change set.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ChangeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub const fn statuses(&self) -> &StatusSet {
        self.engine.statuses()
    }

    #[must_use]
    pub const fn store(&self) -> &ItemStore {
        &self.store
    }

    /// Read-only column view.
    #[must_use]
    pub fn view(&self) -> PartitionView<'_> {
        PartitionView::new(&self.store, self.engine.statuses())
    }

    /// Owned copy of every item in snapshot order.
    #[must_use]
    pub fn items(&self) -> Vec<WorkItem> {
        self.store.get_all()
    }

    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<WorkItem> {
        self.store.snapshot().iter().find(|i| &i.id == id).cloned()
    }

    /// Install a loaded item set.
    ///
    /// Non-dense positions are repaired by compacting every status. The
    /// repair is logged and returned as the changes it made against the
    /// loaded placements; it is not published, so the caller decides whether
    /// a repaired board may be saved.
    ///
    /// # Errors
    ///
    /// - [`BoardError::InvalidStatus`] for an item in an unconfigured status.
    /// - [`BoardError::Validation`] for duplicate ids.
    pub fn restore(&self, items: Vec<WorkItem>) -> Result<Vec<ItemChange>, BoardError> {
        if let Some(stray) = items.iter().find(|i| !self.statuses().contains(&i.status)) {
            return Err(BoardError::InvalidStatus {
                status: stray.status.clone(),
            });
        }

        let (items, repairs) = match store::validate(&items) {
            Ok(()) => (items, Vec::new()),
            Err(ValidationError::NotDense { status, positions }) => {
                let repaired = reorder::compact_all(&items);
                let repairs = changeset::diff(&items, &repaired, self.statuses());
                warn!(
                    %status,
                    ?positions,
                    repaired = repairs.len(),
                    "repairing non-dense positions on load"
                );
                (repaired, repairs)
            }
            Err(err) => return Err(err.into()),
        };

        let _guard = self.store.lock_writes();
        self.store.replace_all(items)?;
        Ok(repairs)
    }

    /// Move one item.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotFound`] or [`BoardError::InvalidStatus`]; the board is
    /// unchanged on error.
    pub fn move_item(&self, instruction: &MoveInstruction) -> Result<MoveReport, BoardError> {
        let transition = self.engine.transition(&self.store, instruction)?;
        Ok(self.finish(&transition.before, transition.after))
    }

    /// Resolve a drop gesture and apply it.
    ///
    /// Returns `Ok(None)` when the gesture is discarded (a miss).
    ///
    /// # Errors
    ///
    /// Same as [`Board::move_item`].
    pub fn drop_item(
        &self,
        dragged: &ItemId,
        target: &DropTarget,
    ) -> Result<Option<MoveReport>, BoardError> {
        let guard = self.store.lock_writes();
        let snapshot = self.store.snapshot();
        let Some(instruction) = resolve_drop(&snapshot, dragged, target) else {
            return Ok(None);
        };
        let transition = self.engine.transition_locked(&self.store, &guard, &instruction)?;
        drop(guard);
        Ok(Some(self.finish(&transition.before, transition.after)))
    }

    /// Renumber one status densely.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidStatus`] if `status` is not configured.
    pub fn compact(&self, status: &StatusKey) -> Result<MoveReport, BoardError> {
        let transition = self.engine.compact(&self.store, status)?;
        Ok(self.finish(&transition.before, transition.after))
    }

    /// Append a new item at the tail of its status.
    ///
    /// # Errors
    ///
    /// [`BoardError::InvalidStatus`] or [`BoardError::DuplicateId`].
    pub fn add_item(&self, new: NewItem) -> Result<WorkItem, BoardError> {
        if !self.statuses().contains(&new.status) {
            return Err(BoardError::InvalidStatus { status: new.status });
        }

        let guard = self.store.lock_writes();
        let before = self.store.snapshot();
        if before.iter().any(|i| i.id == new.id) {
            return Err(BoardError::DuplicateId { id: new.id });
        }

        let tail = column(&before, &new.status).len();
        let item = new.into_item(tail);
        let mut next = before.as_ref().clone();
        next.push(item.clone());
        let committed = reorder::commit(&self.store, next)?;
        drop(guard);
        info!(id = %item.id, status = %item.status, position = tail, "item added");

        self.finish(&before, committed);
        Ok(item)
    }

    /// Remove an item and close the gap it leaves.
    ///
    /// # Errors
    ///
    /// [`BoardError::NotFound`] if no item has `id`.
    pub fn remove_item(&self, id: &ItemId) -> Result<WorkItem, BoardError> {
        let guard = self.store.lock_writes();
        let before = self.store.snapshot();
        let Some(slot) = before.iter().position(|i| &i.id == id) else {
            return Err(BoardError::NotFound { id: id.clone() });
        };

        let mut remaining = before.as_ref().clone();
        let removed = remaining.remove(slot);
        let next = reorder::compact_status(&remaining, &removed.status);
        let committed = reorder::commit(&self.store, next)?;
        drop(guard);
        info!(id = %removed.id, status = %removed.status, "item removed");

        self.finish(&before, committed);
        Ok(removed)
    }

    /// Offer `changes` to the attached sink, if any.
    ///
    /// Sink failures are logged; the committed state is kept either way.
    pub fn publish(&self, changes: &[ItemChange]) {
        if changes.is_empty() {
            return;
        }
        if let Some(sink) = &self.sink {
            if let Err(err) = sink.publish(changes) {
                warn!(error = %err, "change sink failed; local state kept");
            }
        }
    }

    fn finish(&self, before: &Snapshot, items: Vec<WorkItem>) -> MoveReport {
        let changes = changeset::diff(before, &items, self.statuses());
        debug!(changes = changes.len(), "commit finished");
        self.publish(&changes);
        MoveReport { items, changes }
    }
}
