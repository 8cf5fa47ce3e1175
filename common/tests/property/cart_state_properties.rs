use std::collections::HashSet;

use common::cart_state::{CartAction, CartState, reduce};
use proptest::prelude::*;

fn small_id() -> impl Strategy<Value = String> {
    // a tiny id space so adds and removes collide often
    (0u8..12).prop_map(|n| format!("/experiments/ENCSR{n:03}AAA/"))
}

fn action() -> impl Strategy<Value = CartAction> {
    prop_oneof![
        small_id().prop_map(CartAction::AddOne),
        prop::collection::vec(small_id(), 0..6).prop_map(CartAction::AddMany),
        small_id().prop_map(CartAction::RemoveOne),
        prop::collection::vec(small_id(), 0..6).prop_map(CartAction::RemoveMany),
    ]
}

fn replay_on_set(set: &mut HashSet<String>, action: &CartAction) {
    match action {
        CartAction::AddOne(id) => {
            set.insert(id.clone());
        }
        CartAction::AddMany(ids) => set.extend(ids.iter().cloned()),
        CartAction::RemoveOne(id) => {
            set.remove(id);
        }
        CartAction::RemoveMany(ids) => {
            for id in ids {
                set.remove(id);
            }
        }
        _ => {}
    }
}

proptest! {
    #[test]
    fn reduced_items_match_plain_set_replay(actions in prop::collection::vec(action(), 0..40)) {
        let mut state = CartState::default();
        let mut expected = HashSet::new();
        for action in &actions {
            replay_on_set(&mut expected, action);
            state = reduce(&state, action.clone());
        }
        let actual: HashSet<String> = state.items.iter().cloned().collect();
        prop_assert_eq!(actual, expected);
        // no duplicates survive in the ordered view
        prop_assert_eq!(state.items.len(), state.items.to_vec().into_iter().collect::<HashSet<_>>().len());
    }

    #[test]
    fn add_one_is_idempotent(seed in prop::collection::vec(small_id(), 0..10), id in small_id()) {
        let state = reduce(&CartState::default(), CartAction::AddMany(seed));
        let once = reduce(&state, CartAction::AddOne(id.clone()));
        let twice = reduce(&once, CartAction::AddOne(id));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn remove_one_is_idempotent(seed in prop::collection::vec(small_id(), 0..10), id in small_id()) {
        let state = reduce(&CartState::default(), CartAction::AddMany(seed));
        let once = reduce(&state, CartAction::RemoveOne(id.clone()));
        let twice = reduce(&once, CartAction::RemoveOne(id));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn add_many_never_reorders_existing_items(seed in prop::collection::vec(small_id(), 0..10), more in prop::collection::vec(small_id(), 0..10)) {
        let state = reduce(&CartState::default(), CartAction::AddMany(seed));
        let before = state.items.to_vec();
        let after = reduce(&state, CartAction::AddMany(more)).items.to_vec();
        prop_assert_eq!(&after[..before.len()], &before[..]);
    }
}
