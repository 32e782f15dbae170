//! Authoritative in-memory item set.
//!
//! The store holds one immutable snapshot behind an `Arc`. Readers clone the
//! `Arc` and never block behind a planning writer; [`ItemStore::replace_all`]
//! validates the proposed set and then swaps the reference in a single
//! assignment, so a reader observes either the old or the new set in full.
//!
//! Writers that read, compute and commit (a move, a compaction, an insert)
//! hold [`ItemStore::lock_writes`] for the whole cycle.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::trace;

use crate::error::ValidationError;
use crate::model::{StatusKey, WorkItem};

/// Shared, immutable view of the item set at one point in time.
pub type Snapshot = Arc<Vec<WorkItem>>;

/// Held writer lock of one [`ItemStore`]; released on drop.
#[must_use = "the writer lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct WriteGuard<'a> {
    store: &'a ItemStore,
    _held: MutexGuard<'a, ()>,
}

impl WriteGuard<'_> {
    /// True if this guard was taken from `store`.
    #[must_use]
    pub fn guards(&self, store: &ItemStore) -> bool {
        std::ptr::eq(self.store, store)
    }
}

#[derive(Debug, Default)]
pub struct ItemStore {
    current: RwLock<Snapshot>,
    writer: Mutex<()>,
}

impl ItemStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `items`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `items` breaks id uniqueness or density.
    pub fn with_items(items: Vec<WorkItem>) -> Result<Self, ValidationError> {
        validate(&items)?;
        Ok(Self {
            current: RwLock::new(Arc::new(items)),
            writer: Mutex::new(()),
        })
    }

    /// Owned copy of every item, in snapshot order.
    ///
    /// Mutating the returned vector has no effect on the store.
    #[must_use]
    pub fn get_all(&self) -> Vec<WorkItem> {
        self.snapshot().as_ref().clone()
    }

    /// Current snapshot reference.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Install `items` as the new authoritative set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] and leaves the store untouched if two
    /// items share an id or any status has non-dense positions.
    pub fn replace_all(&self, items: Vec<WorkItem>) -> Result<(), ValidationError> {
        validate(&items)?;
        let next = Arc::new(items);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = next;
        trace!(items = slot.len(), "item store snapshot replaced");
        Ok(())
    }

    /// Serialize read-compute-commit writers.
    ///
    /// Readers are never blocked by this guard.
    pub fn lock_writes(&self) -> WriteGuard<'_> {
        WriteGuard {
            store: self,
            _held: self.writer.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Check id uniqueness and per-status density.
///
/// # Errors
///
/// Returns the first violation found. Statuses are checked in name order so
/// the reported violation is deterministic.
pub fn validate(items: &[WorkItem]) -> Result<(), ValidationError> {
    let mut ids = HashSet::with_capacity(items.len());
    let mut by_status: BTreeMap<&StatusKey, Vec<usize>> = BTreeMap::new();

    for item in items {
        if !ids.insert(&item.id) {
            return Err(ValidationError::DuplicateId {
                id: item.id.clone(),
            });
        }
        by_status.entry(&item.status).or_default().push(item.position);
    }

    for (status, mut positions) in by_status {
        positions.sort_unstable();
        let dense = positions.iter().enumerate().all(|(i, p)| i == *p);
        if !dense {
            return Err(ValidationError::NotDense {
                status: status.clone(),
                positions,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: &str, position: usize) -> WorkItem {
        WorkItem::new(id, id.to_uppercase(), status, position)
    }

    #[test]
    fn empty_store_has_no_items() {
        let store = ItemStore::new();
        assert!(store.is_empty());
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn get_all_returns_a_detached_copy() {
        let store = ItemStore::with_items(vec![item("a", "TODO", 0)]).unwrap();
        let mut copy = store.get_all();
        copy[0].position = 7;
        copy.push(item("b", "TODO", 1));

        let fresh = store.get_all();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].position, 0);
    }

    #[test]
    fn replace_all_swaps_whole_set() {
        let store = ItemStore::with_items(vec![item("a", "TODO", 0)]).unwrap();
        let before = store.snapshot();

        store
            .replace_all(vec![item("b", "DONE", 0), item("c", "DONE", 1)])
            .unwrap();

        assert_eq!(before.len(), 1, "old snapshot holders keep the old set");
        let after = store.get_all();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id.as_str(), "b");
    }

    #[test]
    fn replace_all_rejects_gap_and_keeps_state() {
        let store = ItemStore::with_items(vec![item("a", "TODO", 0)]).unwrap();
        let err = store
            .replace_all(vec![item("a", "TODO", 0), item("b", "TODO", 2)])
            .unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotDense {
                status: "TODO".into(),
                positions: vec![0, 2],
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_all_rejects_shared_position() {
        let store = ItemStore::new();
        let err = store
            .replace_all(vec![item("a", "TODO", 0), item("b", "TODO", 0)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotDense { .. }));
    }

    #[test]
    fn replace_all_rejects_duplicate_ids() {
        let store = ItemStore::new();
        let err = store
            .replace_all(vec![item("a", "TODO", 0), item("a", "DONE", 0)])
            .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateId { id: "a".into() });
    }

    #[test]
    fn density_is_checked_per_status() {
        let items = vec![
            item("a", "TODO", 0),
            item("b", "DONE", 0),
            item("c", "TODO", 1),
            item("d", "DONE", 1),
        ];
        assert!(validate(&items).is_ok());
    }

    #[test]
    fn write_guard_knows_its_store() {
        let a = ItemStore::new();
        let b = ItemStore::new();
        let guard = a.lock_writes();
        assert!(guard.guards(&a));
        assert!(!guard.guards(&b));
    }

    #[test]
    fn readers_see_whole_snapshots_during_concurrent_writes() {
        use std::thread;

        let store = Arc::new(ItemStore::with_items(vec![item("a", "TODO", 0)]).unwrap());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for n in 1..200 {
                    let items: Vec<WorkItem> =
                        (0..n).map(|i| item(&format!("i{i}"), "TODO", i)).collect();
                    let _guard = store.lock_writes();
                    store.replace_all(items).unwrap();
                }
            })
        };

        for _ in 0..200 {
            let snap = store.snapshot();
            assert!(validate(&snap).is_ok());
        }
        writer.join().unwrap();
    }
}
