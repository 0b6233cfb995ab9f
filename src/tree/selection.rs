//! Tri-state selection over the category hierarchy.
//!
//! Selecting a category selects its whole subtree. Nothing propagates
//! upward: a parent whose children are all selected shows as
//! indeterminate until it is selected itself.

use std::collections::{HashMap, HashSet};

use super::index::CategoryIndex;
use super::types::{Category, CategoryId, HierarchyError, SelectionState};

/// Selection badge for a single category.
///
/// Own membership wins; otherwise any selected strict descendant makes the
/// category indeterminate. O(subtree) per call, so renderers that badge every
/// row should use [`selection_states`] instead.
pub fn selection_state(
    categories: &[Category],
    id: &str,
    selected: &HashSet<CategoryId>,
) -> Result<SelectionState, HierarchyError> {
    CategoryIndex::new(categories).selection_state(id, selected)
}

/// Toggle `id` and cascade the result to its whole subtree.
///
/// Returns a new set and leaves `current` untouched. If `id` itself is
/// selected, it and every descendant are removed; otherwise they are all
/// added. The decision looks only at `id`'s own membership, not its badge.
pub fn toggle_selection(
    categories: &[Category],
    id: &str,
    current: &HashSet<CategoryId>,
) -> Result<HashSet<CategoryId>, HierarchyError> {
    CategoryIndex::new(categories).toggle_selection(id, current)
}

/// Every category id in the list.
pub fn select_all(categories: &[Category]) -> HashSet<CategoryId> {
    categories.iter().map(|c| c.id.clone()).collect()
}

pub fn select_none() -> HashSet<CategoryId> {
    HashSet::new()
}

/// Badges for every category in one pass.
///
/// Equivalent to calling [`selection_state`] for each record, in O(N) total.
/// Fails if the list contains any cycle.
pub fn selection_states(
    categories: &[Category],
    selected: &HashSet<CategoryId>,
) -> Result<HashMap<CategoryId, SelectionState>, HierarchyError> {
    CategoryIndex::new(categories).selection_states(selected)
}

impl<'a> CategoryIndex<'a> {
    pub fn selection_state(
        &self,
        id: &str,
        selected: &HashSet<CategoryId>,
    ) -> Result<SelectionState, HierarchyError> {
        if selected.contains(id) {
            return Ok(SelectionState::Selected);
        }
        let descendants = self.descendant_ids(id, false)?;
        if descendants.iter().any(|d| selected.contains(d)) {
            Ok(SelectionState::Indeterminate)
        } else {
            Ok(SelectionState::Unselected)
        }
    }

    pub fn toggle_selection(
        &self,
        id: &str,
        current: &HashSet<CategoryId>,
    ) -> Result<HashSet<CategoryId>, HierarchyError> {
        let subtree = self.descendant_ids(id, true)?;
        let mut next = current.clone();
        if current.contains(id) {
            for member in &subtree {
                next.remove(member);
            }
        } else {
            next.extend(subtree);
        }
        Ok(next)
    }

    pub fn selection_states(
        &self,
        selected: &HashSet<CategoryId>,
    ) -> Result<HashMap<CategoryId, SelectionState>, HierarchyError> {
        // marked[id] = id or something below it is selected
        let mut marked: HashMap<&'a str, bool> = HashMap::with_capacity(self.len());
        let mut on_path = HashSet::new();
        for cat in self.categories() {
            self.mark_subtree(cat.id.as_str(), selected, &mut marked, &mut on_path)?;
        }

        let mut states = HashMap::with_capacity(self.len());
        for cat in self.categories() {
            let id = cat.id.as_str();
            let state = if selected.contains(id) {
                SelectionState::Selected
            } else if self
                .child_records(Some(id))
                .any(|child| marked.get(child.id.as_str()).copied().unwrap_or(false))
            {
                SelectionState::Indeterminate
            } else {
                SelectionState::Unselected
            };
            states.insert(cat.id.clone(), state);
        }
        Ok(states)
    }

    fn mark_subtree(
        &self,
        id: &'a str,
        selected: &HashSet<CategoryId>,
        marked: &mut HashMap<&'a str, bool>,
        on_path: &mut HashSet<&'a str>,
    ) -> Result<bool, HierarchyError> {
        if let Some(&done) = marked.get(id) {
            return Ok(done);
        }
        if !on_path.insert(id) {
            tracing::warn!(id, "Cycle detected while computing selection states");
            return Err(HierarchyError::Cycle { id: id.to_owned() });
        }

        let mut any = selected.contains(id);
        for child in self.child_records(Some(id)) {
            // No short-circuit: every child must land in `marked`
            if self.mark_subtree(child.id.as_str(), selected, marked, on_path)? {
                any = true;
            }
        }

        on_path.remove(id);
        marked.insert(id, any);
        Ok(any)
    }
}
