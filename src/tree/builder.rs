use std::collections::HashSet;

use super::index::CategoryIndex;
use super::types::{Category, CategoryId, HierarchyError, TreeNode, NODE_KEYS};

/// Build the visible forest from a flat category list.
///
/// Roots are the records without a parent, in input order; callers sort the
/// slice beforehand if they want a different order. Children are only
/// materialized for nodes that are both expanded and have children, so the
/// work is bounded by what can be seen.
///
/// Records pointing at a parent that does not exist are left out. A node met
/// again on its own path (only possible with duplicated ids) is reported as
/// [`HierarchyError::Cycle`] instead of recursing forever.
pub fn build_tree(
    categories: &[Category],
    expanded: &HashSet<CategoryId>,
) -> Result<Vec<TreeNode>, HierarchyError> {
    let index = CategoryIndex::new(categories);
    index.build_tree(expanded)
}

impl<'a> CategoryIndex<'a> {
    /// [`build_tree`] over an index the caller already holds.
    pub fn build_tree(
        &self,
        expanded: &HashSet<CategoryId>,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        let builder = TreeBuilder {
            index: self,
            expanded,
        };
        let mut on_path = HashSet::new();
        builder.build_level(None, 0, &[], &[], &mut on_path)
    }
}

struct TreeBuilder<'i, 'a> {
    index: &'i CategoryIndex<'a>,
    expanded: &'i HashSet<CategoryId>,
}

impl<'i, 'a> TreeBuilder<'i, 'a> {
    fn build_level(
        &self,
        parent: Option<&str>,
        depth: usize,
        parent_path: &[CategoryId],
        ancestor_flags: &[bool],
        on_path: &mut HashSet<&'a str>,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        let siblings = self.index.children_of(parent);
        let count = siblings.len();
        let mut nodes = Vec::with_capacity(count);

        for (i, &pos) in siblings.iter().enumerate() {
            let category = &self.index.categories()[pos];
            let id = category.id.as_str();

            let has_children = self.index.has_children(id);
            let is_expanded = self.expanded.contains(id);
            let is_last_child = i + 1 == count;

            let mut sibling_has_next = ancestor_flags.to_vec();
            if depth > 0 {
                sibling_has_next.push(!is_last_child);
            }

            let children = if is_expanded && has_children {
                if !on_path.insert(id) {
                    tracing::warn!(id, depth, "Cycle detected while building category tree");
                    return Err(HierarchyError::Cycle { id: id.to_owned() });
                }
                let mut child_path = Vec::with_capacity(parent_path.len() + 1);
                child_path.extend_from_slice(parent_path);
                child_path.push(category.id.clone());

                let children = self.build_level(
                    Some(id),
                    depth + 1,
                    &child_path,
                    &sibling_has_next,
                    on_path,
                )?;
                on_path.remove(id);
                children
            } else {
                Vec::new()
            };

            let mut category = category.clone();
            for key in NODE_KEYS {
                category.extra.remove(key);
            }

            nodes.push(TreeNode {
                category,
                children,
                has_children,
                is_expanded,
                depth,
                parent_path: parent_path.to_vec(),
                is_last_child,
                sibling_has_next,
            });
        }

        Ok(nodes)
    }
}
