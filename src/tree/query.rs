use std::collections::HashSet;

use super::index::CategoryIndex;
use super::types::{Category, CategoryId, HierarchyError};

/// Every id in the subtree under `id`, in pre-order.
///
/// `id` itself leads the list when `include_self` is set, whether or not a
/// record with that id exists.
pub fn descendant_ids(
    categories: &[Category],
    id: &str,
    include_self: bool,
) -> Result<Vec<CategoryId>, HierarchyError> {
    CategoryIndex::new(categories).descendant_ids(id, include_self)
}

/// Ancestor ids of `id`, root first.
///
/// The walk stops at the first parent link naming a record that does not
/// exist. `id` closes the list when `include_self` is set.
pub fn ancestor_ids(
    categories: &[Category],
    id: &str,
    include_self: bool,
) -> Result<Vec<CategoryId>, HierarchyError> {
    CategoryIndex::new(categories).ancestor_ids(id, include_self)
}

impl<'a> CategoryIndex<'a> {
    pub fn descendant_ids(
        &self,
        id: &str,
        include_self: bool,
    ) -> Result<Vec<CategoryId>, HierarchyError> {
        let mut out = Vec::new();
        if include_self {
            out.push(id.to_owned());
        }
        let mut on_path = HashSet::new();
        self.collect_descendants(id, &mut on_path, &mut out)?;
        Ok(out)
    }

    fn collect_descendants<'q>(
        &'q self,
        id: &'q str,
        on_path: &mut HashSet<&'q str>,
        out: &mut Vec<CategoryId>,
    ) -> Result<(), HierarchyError>
    where
        'a: 'q,
    {
        if !on_path.insert(id) {
            tracing::warn!(id, "Cycle detected while collecting descendants");
            return Err(HierarchyError::Cycle { id: id.to_owned() });
        }
        for child in self.child_records(Some(id)) {
            out.push(child.id.clone());
            self.collect_descendants(&child.id, on_path, out)?;
        }
        on_path.remove(id);
        Ok(())
    }

    pub fn ancestor_ids(
        &self,
        id: &str,
        include_self: bool,
    ) -> Result<Vec<CategoryId>, HierarchyError> {
        let mut chain = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(id);

        let mut current = self.get(id);
        while let Some(cat) = current {
            let Some(parent_id) = cat.parent_id.as_deref() else {
                break;
            };
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            if !seen.insert(parent_id) {
                tracing::warn!(id, parent_id, "Cycle detected while walking ancestors");
                return Err(HierarchyError::Cycle {
                    id: parent_id.to_owned(),
                });
            }
            chain.push(parent.id.clone());
            current = Some(parent);
        }

        chain.reverse();
        if include_self {
            chain.push(id.to_owned());
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalogue() -> Vec<Category> {
        vec![
            Category::new("1", None, "Electronics"),
            Category::new("2", Some("1"), "Phones"),
            Category::new("3", Some("2"), "Android"),
            Category::new("4", Some("1"), "Laptops"),
            Category::new("5", None, "Books"),
        ]
    }

    #[test]
    fn test_descendants_pre_order() {
        let cats = catalogue();
        assert_eq!(
            descendant_ids(&cats, "1", false).unwrap(),
            vec!["2", "3", "4"]
        );
        assert_eq!(
            descendant_ids(&cats, "1", true).unwrap(),
            vec!["1", "2", "3", "4"]
        );
    }

    #[test]
    fn test_descendants_of_leaf() {
        let cats = catalogue();
        assert!(descendant_ids(&cats, "3", false).unwrap().is_empty());
        assert_eq!(descendant_ids(&cats, "3", true).unwrap(), vec!["3"]);
    }

    #[test]
    fn test_descendants_of_unknown_id() {
        let cats = catalogue();
        assert!(descendant_ids(&cats, "nope", false).unwrap().is_empty());
        assert_eq!(descendant_ids(&cats, "nope", true).unwrap(), vec!["nope"]);
    }

    #[test]
    fn test_ancestors_root_first() {
        let cats = catalogue();
        assert_eq!(ancestor_ids(&cats, "3", false).unwrap(), vec!["1", "2"]);
        assert_eq!(
            ancestor_ids(&cats, "3", true).unwrap(),
            vec!["1", "2", "3"]
        );
        assert!(ancestor_ids(&cats, "5", false).unwrap().is_empty());
    }

    #[test]
    fn test_ancestors_stop_at_orphan_link() {
        let cats = vec![
            Category::new("a", Some("ghost"), "A"),
            Category::new("b", Some("a"), "B"),
        ];
        assert_eq!(ancestor_ids(&cats, "b", false).unwrap(), vec!["a"]);
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let cats = vec![Category::new("x", Some("x"), "Loop")];
        assert!(matches!(
            descendant_ids(&cats, "x", false),
            Err(HierarchyError::Cycle { .. })
        ));
        assert!(matches!(
            ancestor_ids(&cats, "x", false),
            Err(HierarchyError::Cycle { .. })
        ));
    }

    #[test]
    fn test_two_node_cycle() {
        let cats = vec![
            Category::new("a", Some("b"), "A"),
            Category::new("b", Some("a"), "B"),
        ];
        assert_eq!(
            descendant_ids(&cats, "a", false).unwrap_err(),
            HierarchyError::Cycle { id: "a".into() }
        );
        assert_eq!(
            ancestor_ids(&cats, "a", false).unwrap_err(),
            HierarchyError::Cycle { id: "a".into() }
        );
    }
}
