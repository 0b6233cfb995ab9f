use std::collections::HashSet;

use super::index::CategoryIndex;
use super::types::{Category, CategoryId, HierarchyError};

/// Expanded-id set owned by the caller and handed to the builder on each
/// build. Mutated only through the explicit operations below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<CategoryId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CategoryId>,
    {
        Self {
            expanded: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn as_set(&self) -> &HashSet<CategoryId> {
        &self.expanded
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flip `id` and return whether it is now expanded.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_owned());
            true
        }
    }

    /// Returns false if `id` was already expanded.
    pub fn expand(&mut self, id: &str) -> bool {
        self.expanded.insert(id.to_owned())
    }

    /// Returns false if `id` was already collapsed.
    pub fn collapse(&mut self, id: &str) -> bool {
        self.expanded.remove(id)
    }

    /// Expand every category that has at least one child.
    pub fn expand_all(&mut self, categories: &[Category]) {
        let index = CategoryIndex::new(categories);
        self.expanded = categories
            .iter()
            .filter(|c| index.has_children(&c.id))
            .map(|c| c.id.clone())
            .collect();
    }

    /// Expand each of `ids` whose children sit inside the first `max_depth`
    /// levels (a node at depth `d` qualifies when `d + 1 < max_depth`).
    /// Ids that are unknown or sit on a cycle are skipped. Returns how many
    /// ids were newly expanded.
    pub fn expand_within_depth<'a, I>(
        &mut self,
        categories: &[Category],
        ids: I,
        max_depth: usize,
    ) -> usize
    where
        I: IntoIterator<Item = &'a CategoryId>,
    {
        let index = CategoryIndex::new(categories);
        let mut added = 0;
        for id in ids {
            if !index.contains(id) {
                continue;
            }
            let within = match index.ancestor_ids(id, false) {
                Ok(ancestors) => ancestors.len() + 1 < max_depth,
                Err(_) => false,
            };
            if within && self.expanded.insert(id.clone()) {
                added += 1;
            }
        }
        added
    }

    /// Replace the set with every parent allowed by `max_depth`.
    pub fn expand_all_within_depth(&mut self, categories: &[Category], max_depth: usize) {
        let mut parents = Self::new();
        parents.expand_all(categories);
        self.expanded.clear();
        self.expand_within_depth(categories, parents.as_set(), max_depth);
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Expand every ancestor of `id` so its row becomes visible.
    pub fn reveal(&mut self, categories: &[Category], id: &str) -> Result<(), HierarchyError> {
        let ancestors = CategoryIndex::new(categories).ancestor_ids(id, false)?;
        self.expanded.extend(ancestors);
        Ok(())
    }

    /// Drop ids that no longer name a category, returning how many went.
    pub fn retain_known(&mut self, categories: &[Category]) -> usize {
        let known: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
        let before = self.expanded.len();
        self.expanded.retain(|id| known.contains(id.as_str()));
        before - self.expanded.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<Category> {
        vec![
            Category::new("1", None, "A"),
            Category::new("2", Some("1"), "B"),
            Category::new("3", Some("2"), "C"),
            Category::new("4", None, "D"),
        ]
    }

    #[test]
    fn test_toggle() {
        let mut state = ExpansionState::new();
        assert!(state.toggle("1"));
        assert!(state.is_expanded("1"));
        assert!(!state.toggle("1"));
        assert!(!state.is_expanded("1"));
    }

    #[test]
    fn test_expand_collapse_report_change() {
        let mut state = ExpansionState::new();
        assert!(state.expand("1"));
        assert!(!state.expand("1"));
        assert!(state.collapse("1"));
        assert!(!state.collapse("1"));
    }

    #[test]
    fn test_expand_all_within_depth_stops_at_limit() {
        let mut state = ExpansionState::from_ids(["4"]);
        state.expand_all_within_depth(&catalogue(), 2);
        assert_eq!(state, ExpansionState::from_ids(["1"]));

        state.expand_all_within_depth(&catalogue(), 1);
        assert!(state.is_empty());
    }

    #[test]
    fn test_expand_within_depth_skips_deep_and_unknown() {
        let mut state = ExpansionState::new();
        let ids = vec!["1".to_string(), "2".to_string(), "ghost".to_string()];
        assert_eq!(state.expand_within_depth(&catalogue(), &ids, 2), 1);
        assert_eq!(state, ExpansionState::from_ids(["1"]));
        assert_eq!(state.expand_within_depth(&catalogue(), &ids, 3), 1);
        assert_eq!(state, ExpansionState::from_ids(["1", "2"]));
    }

    #[test]
    fn test_expand_all_only_parents() {
        let mut state = ExpansionState::new();
        state.expand_all(&catalogue());
        assert_eq!(state, ExpansionState::from_ids(["1", "2"]));
    }

    #[test]
    fn test_collapse_all() {
        let mut state = ExpansionState::from_ids(["1", "2"]);
        state.collapse_all();
        assert!(state.is_empty());
    }

    #[test]
    fn test_reveal_expands_ancestors() {
        let mut state = ExpansionState::new();
        state.reveal(&catalogue(), "3").unwrap();
        assert_eq!(state, ExpansionState::from_ids(["1", "2"]));
    }

    #[test]
    fn test_retain_known() {
        let mut state = ExpansionState::from_ids(["1", "gone", "2"]);
        assert_eq!(state.retain_known(&catalogue()), 1);
        assert_eq!(state.len(), 2);
        assert!(!state.is_expanded("gone"));
    }
}
