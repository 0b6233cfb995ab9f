//! Property tests for the tree builder and selection engine.
//!
//! Catalogues are random forests: record `i` either is a root or points at
//! some earlier record, and the list is shuffled so children may come before
//! their parents.

use catalog_tree::tree::{
    ancestor_ids, build_tree, descendant_ids, flatten, selection_state, selection_states,
    toggle_selection, Category, CategoryId, HierarchyError, SelectionState, TreeNode,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::HashSet;

// -- Strategy helpers --

fn arb_catalogue(size: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Category>> {
    prop::collection::vec((any::<bool>(), any::<Index>()), size)
        .prop_map(|links| {
            links
                .iter()
                .enumerate()
                .map(|(i, (is_root, pick))| {
                    let parent = (!is_root && i > 0).then(|| format!("c{}", pick.index(i)));
                    Category::new(format!("c{}", i), parent.as_deref(), format!("Category {}", i))
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

/// Catalogue plus a random subset of its ids and a random target record.
fn arb_selection_case() -> impl Strategy<Value = (Vec<Category>, HashSet<CategoryId>, CategoryId)> {
    (
        arb_catalogue(1..40),
        prop::collection::vec(any::<bool>(), 40),
        any::<Index>(),
    )
        .prop_map(|(cats, mask, pick)| {
            let selected = cats
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(c, _)| c.id.clone())
                .collect();
            let target = cats[pick.index(cats.len())].id.clone();
            (cats, selected, target)
        })
}

fn all_ids(cats: &[Category]) -> HashSet<CategoryId> {
    cats.iter().map(|c| c.id.clone()).collect()
}

fn visible_ids(forest: &[TreeNode]) -> Vec<CategoryId> {
    flatten(forest).iter().map(|n| n.id().to_string()).collect()
}

fn check_last_child(siblings: &[TreeNode]) -> Result<(), TestCaseError> {
    if siblings.is_empty() {
        return Ok(());
    }
    let flagged: Vec<usize> = siblings
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_last_child)
        .map(|(i, _)| i)
        .collect();
    prop_assert_eq!(flagged, vec![siblings.len() - 1]);
    for node in siblings {
        check_last_child(&node.children)?;
    }
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn forest_is_complete_when_fully_expanded(cats in arb_catalogue(0..40)) {
        let forest = build_tree(&cats, &all_ids(&cats)).unwrap();
        let rows = visible_ids(&forest);

        prop_assert_eq!(rows.len(), cats.len());
        let unique: HashSet<&CategoryId> = rows.iter().collect();
        prop_assert_eq!(unique.len(), cats.len());
    }

    #[test]
    fn depth_counts_parent_hops(cats in arb_catalogue(0..40)) {
        let forest = build_tree(&cats, &all_ids(&cats)).unwrap();
        for node in flatten(&forest) {
            let ancestors = ancestor_ids(&cats, node.id(), false).unwrap();
            prop_assert_eq!(node.depth, ancestors.len());
            prop_assert_eq!(&node.parent_path, &ancestors);
            prop_assert_eq!(node.sibling_has_next.len(), node.depth);
        }
    }

    #[test]
    fn collapsed_node_hides_its_subtree((cats, _, target) in arb_selection_case()) {
        let mut expanded = all_ids(&cats);
        expanded.remove(&target);
        let forest = build_tree(&cats, &expanded).unwrap();
        let rows: HashSet<CategoryId> = visible_ids(&forest).into_iter().collect();

        prop_assert!(rows.contains(&target));
        for hidden in descendant_ids(&cats, &target, false).unwrap() {
            prop_assert!(!rows.contains(&hidden), "{} should be hidden", hidden);
        }
    }

    #[test]
    fn select_cascades_to_subtree((cats, _, target) in arb_selection_case()) {
        let selected = toggle_selection(&cats, &target, &HashSet::new()).unwrap();
        let subtree: HashSet<CategoryId> =
            descendant_ids(&cats, &target, true).unwrap().into_iter().collect();
        prop_assert_eq!(selected, subtree);
    }

    #[test]
    fn toggle_twice_restores_disjoint_selection((cats, picked, target) in arb_selection_case()) {
        let subtree: HashSet<CategoryId> =
            descendant_ids(&cats, &target, true).unwrap().into_iter().collect();
        let outside: HashSet<CategoryId> = picked.difference(&subtree).cloned().collect();

        let once = toggle_selection(&cats, &target, &outside).unwrap();
        prop_assert!(subtree.is_subset(&once));
        let twice = toggle_selection(&cats, &target, &once).unwrap();
        prop_assert_eq!(twice, outside);
    }

    #[test]
    fn tri_state_follows_membership((cats, selected, _) in arb_selection_case()) {
        for c in &cats {
            let state = selection_state(&cats, &c.id, &selected).unwrap();
            let below = descendant_ids(&cats, &c.id, false).unwrap();
            let expected = if selected.contains(&c.id) {
                SelectionState::Selected
            } else if below.iter().any(|id| selected.contains(id)) {
                SelectionState::Indeterminate
            } else {
                SelectionState::Unselected
            };
            prop_assert_eq!(state, expected);
        }
    }

    #[test]
    fn batch_states_match_single_lookups((cats, selected, _) in arb_selection_case()) {
        let states = selection_states(&cats, &selected).unwrap();
        prop_assert_eq!(states.len(), cats.len());
        for c in &cats {
            prop_assert_eq!(states[&c.id], selection_state(&cats, &c.id, &selected).unwrap());
        }
    }

    #[test]
    fn exactly_one_last_child_per_sibling_group(cats in arb_catalogue(0..40)) {
        let forest = build_tree(&cats, &all_ids(&cats)).unwrap();
        check_last_child(&forest)?;
    }
}

// ============================================================================
// Fixed Scenarios
// ============================================================================

#[test]
fn test_three_level_chain() {
    let cats = vec![
        Category::new("1", None, "A"),
        Category::new("2", Some("1"), "B"),
        Category::new("3", Some("2"), "C"),
    ];
    let expanded: HashSet<CategoryId> = ["1", "2"].iter().map(|s| s.to_string()).collect();

    let forest = build_tree(&cats, &expanded).unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].depth, 0);
    assert_eq!(forest[0].children[0].id(), "2");
    assert_eq!(forest[0].children[0].depth, 1);
    assert_eq!(forest[0].children[0].children[0].id(), "3");
    assert_eq!(forest[0].children[0].children[0].depth, 2);

    assert_eq!(visible_ids(&forest), vec!["1", "2", "3"]);

    let all: HashSet<CategoryId> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(toggle_selection(&cats, "1", &HashSet::new()).unwrap(), all);

    let only_leaf: HashSet<CategoryId> = ["3".to_string()].into_iter().collect();
    assert_eq!(
        selection_state(&cats, "2", &only_leaf).unwrap(),
        SelectionState::Indeterminate
    );
    let only_root: HashSet<CategoryId> = ["1".to_string()].into_iter().collect();
    assert_eq!(
        selection_state(&cats, "1", &only_root).unwrap(),
        SelectionState::Selected
    );
}

#[test]
fn test_empty_catalogue() {
    let forest = build_tree(&[], &HashSet::new()).unwrap();
    assert!(forest.is_empty());
    assert!(flatten(&forest).is_empty());
}

#[test]
fn test_cycles_fail_fast() {
    let cats = vec![
        Category::new("root", None, "Root"),
        Category::new("a", Some("b"), "A"),
        Category::new("b", Some("a"), "B"),
    ];

    assert!(matches!(
        descendant_ids(&cats, "a", true),
        Err(HierarchyError::Cycle { .. })
    ));
    assert!(matches!(
        ancestor_ids(&cats, "a", true),
        Err(HierarchyError::Cycle { .. })
    ));
    assert!(matches!(
        toggle_selection(&cats, "a", &HashSet::new()),
        Err(HierarchyError::Cycle { .. })
    ));
    assert!(selection_states(&cats, &HashSet::new()).is_err());

    // The unreachable loop is simply not part of the forest
    let forest = build_tree(&cats, &all_ids(&cats)).unwrap();
    assert_eq!(visible_ids(&forest), vec!["root"]);
}

#[test]
fn test_orphans_are_left_out() {
    let cats = vec![
        Category::new("1", None, "A"),
        Category::new("2", Some("missing"), "Orphan"),
    ];
    let forest = build_tree(&cats, &all_ids(&cats)).unwrap();
    assert_eq!(visible_ids(&forest), vec!["1"]);
}
