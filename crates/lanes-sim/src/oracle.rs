use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use lanes_core::{ItemId, StatusKey, WorkItem};
use serde::{Deserialize, Serialize};

use crate::gesture::{Gesture, Outcome};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Outcome of one or more invariant checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResult {
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            violations: Vec::new(),
        }
    }

    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }

    /// Fold `other` into `self`; failures accumulate.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if !other.passed {
            self.passed = false;
            self.violations.extend(other.violations);
        }
        self
    }
}

/// A broken board invariant, tagged with the step that broke it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "invariant", rename_all = "snake_case")]
pub enum InvariantViolation {
    /// A status's positions are not exactly `0..n`.
    Density {
        step: usize,
        status: StatusKey,
        positions: Vec<usize>,
    },
    /// Two items share an id.
    DuplicateId { step: usize, id: ItemId },
    /// Items appeared or vanished without a create/remove accounting for it.
    IdSet {
        step: usize,
        missing: Vec<ItemId>,
        unexpected: Vec<ItemId>,
    },
    /// A gesture that targets the item's own slot changed the board.
    NoOpMutated { step: usize, gesture: String },
    /// A discarded gesture changed the board.
    MissMutated { step: usize, gesture: String },
    /// A rejected gesture changed the board.
    RejectedMutated { step: usize, code: String },
    /// An item outside the affected columns changed placement.
    BlastRadius {
        step: usize,
        id: ItemId,
        status: StatusKey,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Density {
                step,
                status,
                positions,
            } => write!(f, "step {step}: status {status} not dense {positions:?}"),
            Self::DuplicateId { step, id } => write!(f, "step {step}: duplicate id {id}"),
            Self::IdSet {
                step,
                missing,
                unexpected,
            } => write!(
                f,
                "step {step}: id set drifted (missing={missing:?}, unexpected={unexpected:?})"
            ),
            Self::NoOpMutated { step, gesture } => {
                write!(f, "step {step}: no-op `{gesture}` changed the board")
            }
            Self::MissMutated { step, gesture } => {
                write!(f, "step {step}: discarded `{gesture}` changed the board")
            }
            Self::RejectedMutated { step, code } => {
                write!(f, "step {step}: rejected gesture ({code}) changed the board")
            }
            Self::BlastRadius { step, id, status } => {
                write!(f, "step {step}: bystander {id} in {status} was moved")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

/// Everything the oracle needs to judge one simulation step.
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub step: usize,
    pub gesture: &'a Gesture,
    pub outcome: &'a Outcome,
    pub before: &'a [WorkItem],
    pub after: &'a [WorkItem],
}

/// Board invariant checks run after every simulated gesture.
pub struct InvariantOracle;

impl InvariantOracle {
    /// Unique ids and dense positions in every status.
    #[must_use]
    pub fn check_board(step: usize, items: &[WorkItem]) -> OracleResult {
        let mut violations = Vec::new();
        let mut seen = BTreeSet::new();
        let mut by_status: BTreeMap<&StatusKey, Vec<usize>> = BTreeMap::new();

        for item in items {
            if !seen.insert(&item.id) {
                violations.push(InvariantViolation::DuplicateId {
                    step,
                    id: item.id.clone(),
                });
            }
            by_status.entry(&item.status).or_default().push(item.position);
        }

        for (status, mut positions) in by_status {
            positions.sort_unstable();
            if positions.iter().enumerate().any(|(i, p)| i != *p) {
                violations.push(InvariantViolation::Density {
                    step,
                    status: status.clone(),
                    positions,
                });
            }
        }

        OracleResult::from_violations(violations)
    }

    /// Ids after the step equal ids before, adjusted by an applied
    /// create or remove.
    #[must_use]
    pub fn check_id_set(view: &StepView<'_>) -> OracleResult {
        let mut expected: BTreeSet<&ItemId> = view.before.iter().map(|i| &i.id).collect();
        if matches!(view.outcome, Outcome::Applied { .. }) {
            match view.gesture {
                Gesture::Create { id, .. } => {
                    expected.insert(id);
                }
                Gesture::Remove { id } => {
                    expected.remove(id);
                }
                _ => {}
            }
        }
        let actual: BTreeSet<&ItemId> = view.after.iter().map(|i| &i.id).collect();

        if expected == actual {
            return OracleResult::pass();
        }
        OracleResult::from_violations(vec![InvariantViolation::IdSet {
            step: view.step,
            missing: expected.difference(&actual).map(|id| (*id).clone()).collect(),
            unexpected: actual.difference(&expected).map(|id| (*id).clone()).collect(),
        }])
    }

    /// Rejected, discarded and self-targeting gestures leave the board
    /// exactly as it was.
    #[must_use]
    pub fn check_unchanged(view: &StepView<'_>) -> OracleResult {
        if view.before == view.after {
            return OracleResult::pass();
        }
        let violation = match view.outcome {
            Outcome::Rejected { code } => Some(InvariantViolation::RejectedMutated {
                step: view.step,
                code: code.clone(),
            }),
            Outcome::Discarded => Some(InvariantViolation::MissMutated {
                step: view.step,
                gesture: view.gesture.to_string(),
            }),
            Outcome::Applied { .. } if targets_own_slot(view.gesture, view.before) => {
                Some(InvariantViolation::NoOpMutated {
                    step: view.step,
                    gesture: view.gesture.to_string(),
                })
            }
            Outcome::Applied { .. } => None,
        };
        OracleResult::from_violations(violation.into_iter().collect())
    }

    /// Items outside the columns a gesture touches keep their placement.
    #[must_use]
    pub fn check_blast_radius(view: &StepView<'_>) -> OracleResult {
        if !matches!(view.outcome, Outcome::Applied { .. }) {
            return OracleResult::pass();
        }

        let subject = view.gesture.subject();
        let mut touched: BTreeSet<&StatusKey> = BTreeSet::new();
        for item in view.before.iter().chain(view.after) {
            if &item.id == subject {
                touched.insert(&item.status);
            }
        }

        let after: HashMap<&ItemId, &WorkItem> = view.after.iter().map(|i| (&i.id, i)).collect();
        let violations = view
            .before
            .iter()
            .filter(|item| !touched.contains(&item.status))
            .filter(|item| {
                after
                    .get(&item.id)
                    .is_none_or(|now| now.status != item.status || now.position != item.position)
            })
            .map(|item| InvariantViolation::BlastRadius {
                step: view.step,
                id: item.id.clone(),
                status: item.status.clone(),
            })
            .collect();
        OracleResult::from_violations(violations)
    }

    /// Run every check for one step.
    #[must_use]
    pub fn check_step(view: &StepView<'_>) -> OracleResult {
        Self::check_board(view.step, view.after)
            .merge(Self::check_id_set(view))
            .merge(Self::check_unchanged(view))
            .merge(Self::check_blast_radius(view))
    }
}

/// True when the gesture asks for the slot the item already occupies.
///
/// Overshooting the tail of the item's own column counts, since the index
/// clamps back to where the item already is.
fn targets_own_slot(gesture: &Gesture, before: &[WorkItem]) -> bool {
    let Some(item) = before.iter().find(|i| &i.id == gesture.subject()) else {
        return false;
    };
    let is_last = before
        .iter()
        .filter(|i| i.status == item.status)
        .all(|i| i.position <= item.position);

    match gesture {
        Gesture::DropOnItem { dragged, target } => dragged == target,
        Gesture::DropOnColumn { status, .. } => status == &item.status && is_last,
        Gesture::Move { status, index, .. } => {
            status == &item.status
                && (*index == item.position || (is_last && *index >= item.position))
        }
        Gesture::Miss { .. } | Gesture::Create { .. } | Gesture::Remove { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: &str, position: usize) -> WorkItem {
        WorkItem::new(id, id, status, position)
    }

    #[test]
    fn dense_board_passes() {
        let items = vec![item("a", "TODO", 0), item("b", "TODO", 1), item("c", "DONE", 0)];
        assert!(InvariantOracle::check_board(0, &items).passed);
    }

    #[test]
    fn gaps_and_duplicates_are_reported() {
        let items = vec![item("a", "TODO", 0), item("a", "TODO", 2)];
        let result = InvariantOracle::check_board(4, &items);
        assert!(!result.passed);
        assert_eq!(result.violations.len(), 2);
        assert!(matches!(
            result.violations[1],
            InvariantViolation::Density { step: 4, .. }
        ));
    }

    #[test]
    fn create_accounts_for_new_id() {
        let before = vec![item("a", "TODO", 0)];
        let after = vec![item("a", "TODO", 0), item("b", "TODO", 1)];
        let gesture = Gesture::Create {
            id: "b".into(),
            status: "TODO".into(),
        };
        let outcome = Outcome::Applied { changes: 1 };
        let view = StepView {
            step: 1,
            gesture: &gesture,
            outcome: &outcome,
            before: &before,
            after: &after,
        };
        assert!(InvariantOracle::check_step(&view).passed);
    }

    #[test]
    fn vanished_item_is_reported() {
        let before = vec![item("a", "TODO", 0), item("b", "TODO", 1)];
        let after = vec![item("a", "TODO", 0)];
        let gesture = Gesture::Move {
            item: "a".into(),
            status: "TODO".into(),
            index: 0,
        };
        let outcome = Outcome::Applied { changes: 0 };
        let view = StepView {
            step: 2,
            gesture: &gesture,
            outcome: &outcome,
            before: &before,
            after: &after,
        };
        let result = InvariantOracle::check_id_set(&view);
        assert_eq!(
            result.violations,
            vec![InvariantViolation::IdSet {
                step: 2,
                missing: vec!["b".into()],
                unexpected: vec![],
            }]
        );
    }

    #[test]
    fn mutating_miss_is_reported() {
        let before = vec![item("a", "TODO", 0)];
        let after = vec![item("a", "DONE", 0)];
        let gesture = Gesture::Miss { dragged: "a".into() };
        let outcome = Outcome::Discarded;
        let view = StepView {
            step: 3,
            gesture: &gesture,
            outcome: &outcome,
            before: &before,
            after: &after,
        };
        assert!(matches!(
            InvariantOracle::check_unchanged(&view).violations.as_slice(),
            [InvariantViolation::MissMutated { step: 3, .. }]
        ));
    }

    #[test]
    fn overshoot_on_last_item_counts_as_own_slot() {
        let before = vec![item("a", "TODO", 0), item("b", "TODO", 1)];
        let overshoot = Gesture::Move {
            item: "b".into(),
            status: "TODO".into(),
            index: 9,
        };
        assert!(targets_own_slot(&overshoot, &before));

        let not_last = Gesture::Move {
            item: "a".into(),
            status: "TODO".into(),
            index: 9,
        };
        assert!(!targets_own_slot(&not_last, &before));
    }

    #[test]
    fn bystander_move_breaks_blast_radius() {
        let before = vec![item("a", "TODO", 0), item("x", "REVIEW", 0), item("y", "REVIEW", 1)];
        let after = vec![item("a", "DONE", 0), item("x", "REVIEW", 1), item("y", "REVIEW", 0)];
        let gesture = Gesture::Move {
            item: "a".into(),
            status: "DONE".into(),
            index: 0,
        };
        let outcome = Outcome::Applied { changes: 3 };
        let view = StepView {
            step: 5,
            gesture: &gesture,
            outcome: &outcome,
            before: &before,
            after: &after,
        };
        let result = InvariantOracle::check_blast_radius(&view);
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn violations_render_readably() {
        let v = InvariantViolation::BlastRadius {
            step: 7,
            id: "t-1".into(),
            status: "DONE".into(),
        };
        assert_eq!(v.to_string(), "step 7: bystander t-1 in DONE was moved");
    }
}
