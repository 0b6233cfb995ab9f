use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Category identifiers are opaque strings issued by the backend.
pub type CategoryId = String;

// ============================================================================
// Error Types
// ============================================================================

/// Failures raised while walking the parent-pointer hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// A category was reached twice on the same root-to-leaf path.
    #[error("Cyclic category graph: '{id}' is its own ancestor")]
    Cycle { id: CategoryId },
}

// ============================================================================
// Category Record
// ============================================================================

/// A category record exactly as the backend supplies it.
///
/// Only `id` and `parent_id` drive the tree logic. The display attributes are
/// read by the tree-table and everything else is carried through `extra`
/// untouched, so a record serializes back to the shape it was read from.
///
/// `_id` and `parent` are preferred; `id` and `parentId` are read only when
/// the preferred key is absent, and otherwise stay in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCategory")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// `None` for root-level categories.
    #[serde(rename = "parent")]
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    /// Depth as reported by the server (0 = root). Never used to place nodes.
    pub level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wire shape before the id keys are resolved. The id and parent keys are
/// left in `extra` so records carrying both spellings still parse.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    level: i64,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    product_count: Option<u64>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawCategory> for Category {
    type Error = String;

    fn try_from(raw: RawCategory) -> Result<Self, Self::Error> {
        let RawCategory {
            name,
            slug,
            level,
            is_active,
            product_count,
            created_at,
            updated_at,
            mut extra,
        } = raw;

        let id_key = if extra.contains_key("_id") { "_id" } else { "id" };
        let id = match extra.remove(id_key) {
            Some(value) => id_from_value(value).ok_or_else(|| format!("invalid `{}`", id_key))?,
            None => return Err("missing field `_id`".to_string()),
        };

        let parent_key = if extra.contains_key("parent") {
            "parent"
        } else {
            "parentId"
        };
        let parent_id = match extra.remove(parent_key) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                id_from_value(value).ok_or_else(|| format!("invalid `{}`", parent_key))?,
            ),
        };

        Ok(Self {
            id,
            parent_id,
            name,
            slug,
            level,
            is_active,
            product_count,
            created_at,
            updated_at,
            extra,
        })
    }
}

/// Ids arrive as strings; numeric ids are accepted and stringified.
fn id_from_value(value: Value) -> Option<CategoryId> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Category {
    /// Build a record by hand. The slug is derived from the name.
    pub fn new(id: impl Into<CategoryId>, parent_id: Option<&str>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            parent_id: parent_id.map(str::to_owned),
            slug: slugify(&name),
            name,
            level: 0,
            is_active: None,
            product_count: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Whether the record is live in the storefront. Records without the
    /// flag are treated as active.
    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

// ============================================================================
// Tree Node
// ============================================================================

/// Keys written by `TreeNode` itself. Backend records carrying any of these
/// lose them from `extra` when placed in the tree.
pub(crate) const NODE_KEYS: [&str; 7] = [
    "children",
    "hasChildren",
    "isExpanded",
    "depth",
    "parentPath",
    "isLastChild",
    "siblingHasNext",
];

/// A category placed in the hierarchy.
///
/// Nodes are value objects rebuilt from scratch whenever the flat list or the
/// expansion set changes. Children are only materialized for expanded nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<TreeNode>,
    /// True iff at least one record names this node as its parent.
    pub has_children: bool,
    pub is_expanded: bool,
    /// 0 for roots, parent depth + 1 otherwise.
    pub depth: usize,
    /// Ancestor ids from the root down to the immediate parent.
    pub parent_path: Vec<CategoryId>,
    /// Last among its siblings in input order.
    pub is_last_child: bool,
    /// One entry per non-root level on the path to this node: entry `k` tells
    /// whether the ancestor-or-self at depth `k + 1` has a later sibling.
    /// Always `depth` entries long.
    pub sibling_has_next: Vec<bool>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.category.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_path.last().map(String::as_str)
    }
}

// ============================================================================
// Selection State
// ============================================================================

/// Tri-state selection badge for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionState {
    /// The category itself is in the selected set.
    Selected,
    /// Not selected itself, but at least one strict descendant is.
    Indeterminate,
    Unselected,
}

impl SelectionState {
    /// Checkbox marker used by the text and terminal renderers.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Selected => "[x]",
            Self::Indeterminate => "[-]",
            Self::Unselected => "[ ]",
        }
    }
}
