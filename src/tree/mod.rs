//! Category tree builder and selection engine.
//!
//! Everything here is synchronous and pure: the flat category list, the
//! expanded-id set and the selected-id set are owned by the caller and passed
//! in on every call, and every result is a fresh value.
//!
//! - [`builder`] - flat list + expanded ids → nested forest
//! - [`flatten`] - forest → visible rows, pre-order
//! - [`query`] - descendant and ancestor id walks
//! - [`selection`] - tri-state badges and cascading toggles
//! - [`expansion`] - the caller-owned expanded-id set
//! - [`filter`] - text/status filters that keep ancestors of matches
//! - [`guides`] - connector-line prefixes for rendered rows
//!
//! Every recursive walk tracks the ids on its current path and fails with
//! [`HierarchyError::Cycle`] rather than looping on malformed input.
//!
//! # Example
//!
//! ```
//! use std::collections::HashSet;
//! use catalog_tree::tree::{build_tree, flatten, toggle_selection, Category};
//!
//! let categories = vec![
//!     Category::new("1", None, "A"),
//!     Category::new("2", Some("1"), "B"),
//!     Category::new("3", Some("2"), "C"),
//! ];
//! let expanded: HashSet<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();
//!
//! let tree = build_tree(&categories, &expanded).unwrap();
//! let rows: Vec<String> = flatten(&tree).iter().map(|n| n.id().to_string()).collect();
//! assert_eq!(rows, ["1", "2", "3"]);
//!
//! let selected = toggle_selection(&categories, "1", &HashSet::new()).unwrap();
//! assert_eq!(selected.len(), 3);
//! ```

pub mod builder;
pub mod expansion;
pub mod filter;
pub mod flatten;
pub mod guides;
pub mod index;
pub mod query;
pub mod selection;
pub mod types;

pub use builder::build_tree;
pub use expansion::ExpansionState;
pub use filter::{CategoryFilter, FilterOutcome, StatusFilter};
pub use flatten::flatten;
pub use guides::{guide_prefix, render_outline};
pub use index::CategoryIndex;
pub use query::{ancestor_ids, descendant_ids};
pub use selection::{
    select_all, select_none, selection_state, selection_states, toggle_selection,
};
pub use types::{Category, CategoryId, HierarchyError, SelectionState, TreeNode};
