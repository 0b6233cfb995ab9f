use std::collections::HashSet;

use super::index::CategoryIndex;
use super::types::{Category, CategoryId, HierarchyError};

/// Status column filter of the admin table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl StatusFilter {
    /// Cycle: All → Active → Inactive → All.
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Inactive,
            Self::Inactive => Self::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn matches(self, category: &Category) -> bool {
        match self {
            Self::All => true,
            Self::Active => category.active(),
            Self::Inactive => !category.active(),
        }
    }
}

/// Text and status filter applied before the tree is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    /// Case-insensitive substring of the name or slug.
    pub query: Option<String>,
    pub status: StatusFilter,
}

/// Records kept by a filter, plus what the tree needs to show them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    /// Matches and their ancestors, in input order.
    pub categories: Vec<Category>,
    /// Ids that matched the filter themselves.
    pub matched: HashSet<CategoryId>,
    /// Ancestors to expand so that every match is visible.
    pub reveal: HashSet<CategoryId>,
}

impl CategoryFilter {
    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn is_empty(&self) -> bool {
        self.needle().is_none() && self.status == StatusFilter::All
    }

    pub fn matches(&self, category: &Category) -> bool {
        self.matches_needle(category, self.needle().as_deref())
    }

    fn matches_needle(&self, category: &Category, needle: Option<&str>) -> bool {
        if !self.status.matches(category) {
            return false;
        }
        match needle {
            None => true,
            Some(q) => {
                category.name.to_lowercase().contains(q) || category.slug.to_lowercase().contains(q)
            }
        }
    }

    /// Keep matching records and every ancestor needed to reach them.
    ///
    /// Ancestors that do not match themselves are kept so the tree stays
    /// connected; they are listed in `reveal`, not in `matched`.
    pub fn apply(&self, categories: &[Category]) -> Result<FilterOutcome, HierarchyError> {
        if self.is_empty() {
            return Ok(FilterOutcome {
                categories: categories.to_vec(),
                matched: categories.iter().map(|c| c.id.clone()).collect(),
                reveal: HashSet::new(),
            });
        }

        let needle = self.needle();
        let index = CategoryIndex::new(categories);
        let mut matched = HashSet::new();
        let mut reveal = HashSet::new();

        for cat in categories {
            if self.matches_needle(cat, needle.as_deref()) {
                reveal.extend(index.ancestor_ids(&cat.id, false)?);
                matched.insert(cat.id.clone());
            }
        }

        let kept = categories
            .iter()
            .filter(|c| matched.contains(&c.id) || reveal.contains(&c.id))
            .cloned()
            .collect();

        tracing::debug!(
            query = ?self.query,
            status = self.status.label(),
            matched = matched.len(),
            "Applied category filter"
        );

        Ok(FilterOutcome {
            categories: kept,
            matched,
            reveal,
        })
    }
}
