use std::collections::HashMap;

use super::types::Category;

/// Parent-pointer index over a flat category list.
///
/// Built once in O(N) so tree construction and subtree queries walk child
/// lists instead of re-filtering the whole slice at every level.
///
/// Records whose parent id names no existing record are indexed under that
/// id like any other child; since no node with that id is ever visited, they
/// never show up in a tree or in a descendant walk.
#[derive(Debug)]
pub struct CategoryIndex<'a> {
    categories: &'a [Category],
    /// First occurrence wins when ids are duplicated.
    by_id: HashMap<&'a str, usize>,
    roots: Vec<usize>,
    /// Positions of child records, in input order.
    children: HashMap<&'a str, Vec<usize>>,
}

impl<'a> CategoryIndex<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        let mut by_id = HashMap::with_capacity(categories.len());
        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<usize>> = HashMap::new();

        for (pos, cat) in categories.iter().enumerate() {
            by_id.entry(cat.id.as_str()).or_insert(pos);
            match cat.parent_id.as_deref() {
                None => roots.push(pos),
                Some(parent) => children.entry(parent).or_default().push(pos),
            }
        }

        Self {
            categories,
            by_id,
            roots,
            children,
        }
    }

    pub fn categories(&self) -> &'a [Category] {
        self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a Category> {
        self.by_id.get(id).map(|&pos| &self.categories[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Positions of the records whose parent is `parent` (`None` = roots).
    pub fn children_of(&self, parent: Option<&str>) -> &[usize] {
        match parent {
            None => &self.roots,
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Child records of `parent`, in input order.
    pub fn child_records<'s>(
        &'s self,
        parent: Option<&str>,
    ) -> impl Iterator<Item = &'a Category> + 's {
        let categories = self.categories;
        self.children_of(parent)
            .iter()
            .map(move |&pos| &categories[pos])
    }

    /// True iff at least one record names `id` as its parent.
    pub fn has_children(&self, id: &str) -> bool {
        !self.children_of(Some(id)).is_empty()
    }
}
