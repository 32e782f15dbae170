//! Placement diffs between two snapshots, for syncing with a backend.
//!
//! After a local commit the board hands the changed placements to a
//! [`ChangeSink`]. Publishing is best-effort: the local state is already
//! committed and is never rolled back because a sink failed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ItemId, StatusKey, StatusSet, WorkItem};

/// Where an item sits on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub status: StatusKey,
    pub position: usize,
}

impl From<&WorkItem> for Placement {
    fn from(item: &WorkItem) -> Self {
        Self {
            status: item.status.clone(),
            position: item.position,
        }
    }
}

/// One item whose placement changed.
///
/// `from` is `None` for an item that did not exist before, `to` is `None`
/// for an item that was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    pub id: ItemId,
    pub from: Option<Placement>,
    pub to: Option<Placement>,
}

/// Every item whose placement differs between `before` and `after`.
///
/// Ordered by destination status rank, then destination position; removals
/// come last in id order.
#[must_use]
pub fn diff(before: &[WorkItem], after: &[WorkItem], statuses: &StatusSet) -> Vec<ItemChange> {
    let old: HashMap<&ItemId, &WorkItem> = before.iter().map(|i| (&i.id, i)).collect();
    let new: HashMap<&ItemId, &WorkItem> = after.iter().map(|i| (&i.id, i)).collect();

    let mut changes: Vec<ItemChange> = after
        .iter()
        .filter_map(|item| {
            let prev = old.get(&item.id).map(|p| Placement::from(*p));
            let next = Placement::from(item);
            (prev.as_ref() != Some(&next)).then(|| ItemChange {
                id: item.id.clone(),
                from: prev,
                to: Some(next),
            })
        })
        .collect();

    let mut removed: Vec<ItemChange> = before
        .iter()
        .filter(|item| !new.contains_key(&item.id))
        .map(|item| ItemChange {
            id: item.id.clone(),
            from: Some(Placement::from(item)),
            to: None,
        })
        .collect();
    removed.sort_by(|a, b| a.id.cmp(&b.id));

    changes.sort_by_key(|change| {
        change.to.as_ref().map(|to| {
            (
                statuses.rank(&to.status).unwrap_or(usize::MAX),
                to.position,
            )
        })
    });
    changes.extend(removed);
    changes
}

/// Receiver of committed placement changes (the remote backend boundary).
pub trait ChangeSink: Send + Sync {
    /// Publish changes that are already committed locally.
    ///
    /// # Errors
    ///
    /// Any error is logged by the caller and otherwise ignored.
    fn publish(&self, changes: &[ItemChange]) -> anyhow::Result<()>;
}
