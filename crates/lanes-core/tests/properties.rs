use std::collections::BTreeSet;

use lanes_core::reorder::{compact_all, plan_move};
use lanes_core::store::validate;
use lanes_core::{ItemStore, MoveInstruction, ReorderEngine, StatusSet, WorkItem};
use proptest::prelude::*;

use generators::*;

fn ids(items: &[WorkItem]) -> BTreeSet<String> {
    items.iter().map(|i| i.id.to_string()).collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn moves_keep_every_status_dense((items, instruction) in arb_board_and_move()) {
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        prop_assert!(validate(&plan.items).is_ok());
        for status in StatusSet::default().iter() {
            let found = positions(&plan.items, status);
            let expected: Vec<usize> = (0..found.len()).collect();
            prop_assert_eq!(found, expected);
        }
    }

    #[test]
    fn moves_preserve_the_id_set((items, instruction) in arb_board_and_move()) {
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        prop_assert_eq!(plan.items.len(), items.len());
        prop_assert_eq!(ids(&plan.items), ids(&items));
    }

    #[test]
    fn moved_item_lands_at_clamped_index((items, instruction) in arb_board_and_move()) {
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        let moved = plan
            .items
            .iter()
            .find(|i| i.id == instruction.item_id)
            .unwrap();
        prop_assert_eq!(&moved.status, &instruction.target_status);
        prop_assert!(moved.position <= instruction.target_index);
        prop_assert_eq!(moved.position, plan.index);
    }

    #[test]
    fn only_origin_and_destination_change((items, instruction) in arb_board_and_move()) {
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        for (before, after) in items.iter().zip(&plan.items) {
            prop_assert_eq!(&before.id, &after.id);
            let touched = before.status == plan.origin
                || before.status == instruction.target_status;
            if !touched {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn moving_onto_own_slot_is_identity(items in arb_board(), pick in any::<prop::sample::Index>()) {
        let chosen = &items[pick.index(items.len())];
        let instruction = MoveInstruction::new(
            chosen.id.clone(),
            chosen.status.clone(),
            chosen.position,
        );
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        prop_assert_eq!(plan.items, items);
    }

    #[test]
    fn relative_order_of_bystanders_is_kept((items, instruction) in arb_board_and_move()) {
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        for status in StatusSet::default().iter() {
            let order = |set: &[WorkItem]| {
                let mut col: Vec<&WorkItem> = set
                    .iter()
                    .filter(|i| &i.status == status && i.id != instruction.item_id)
                    .collect();
                col.sort_by_key(|i| i.position);
                col.into_iter().map(|i| i.id.to_string()).collect::<Vec<_>>()
            };
            prop_assert_eq!(order(&items), order(&plan.items));
        }
    }

    #[test]
    fn compact_all_is_idempotent_on_dense_boards(items in arb_board()) {
        prop_assert_eq!(compact_all(&items), items);
    }

    #[test]
    fn engine_commits_what_it_plans((items, instruction) in arb_board_and_move()) {
        let store = ItemStore::with_items(items.clone()).unwrap();
        let engine = ReorderEngine::default();
        let committed = engine.move_item(&store, &instruction).unwrap();
        let plan = plan_move(&items, &StatusSet::default(), &instruction).unwrap();
        prop_assert_eq!(&committed, &plan.items);
        prop_assert_eq!(store.get_all(), committed);
    }
}
