//! Read-only projection of the store into ordered per-status columns.

use serde::Serialize;

use crate::model::{StatusKey, StatusSet, WorkItem};
use crate::store::ItemStore;

/// Items of `status`, ordered by position.
///
/// Ties (which a valid store never has) fall back to snapshot order because
/// the sort is stable.
#[must_use]
pub fn column<'a>(items: &'a [WorkItem], status: &StatusKey) -> Vec<&'a WorkItem> {
    let mut out: Vec<&WorkItem> = items.iter().filter(|i| &i.status == status).collect();
    out.sort_by_key(|i| i.position);
    out
}

/// One rendered column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub status: StatusKey,
    pub items: Vec<WorkItem>,
}

/// Borrowing view over a store and its configured statuses.
///
/// Holds no state of its own, so every call reflects the latest commit.
#[derive(Debug, Clone, Copy)]
pub struct PartitionView<'a> {
    store: &'a ItemStore,
    statuses: &'a StatusSet,
}

impl<'a> PartitionView<'a> {
    #[must_use]
    pub const fn new(store: &'a ItemStore, statuses: &'a StatusSet) -> Self {
        Self { store, statuses }
    }

    /// Items with `status`, ascending by position.
    ///
    /// Empty for a status with no items, configured or not.
    #[must_use]
    pub fn by_status(&self, status: &StatusKey) -> Vec<WorkItem> {
        let snapshot = self.store.snapshot();
        column(&snapshot, status).into_iter().cloned().collect()
    }

    /// Configured statuses in display order.
    #[must_use]
    pub fn all_statuses(&self) -> &'a [StatusKey] {
        self.statuses.as_slice()
    }

    /// Every configured column, read from a single snapshot.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        let snapshot = self.store.snapshot();
        self.statuses
            .iter()
            .map(|status| Column {
                status: status.clone(),
                items: column(&snapshot, status).into_iter().cloned().collect(),
            })
            .collect()
    }
}
