use std::collections::HashMap;

use super::flatten::flatten;
use super::types::{CategoryId, SelectionState, TreeNode};
use crate::util::strip_control_chars;

const PIPE: &str = "│  ";
const BLANK: &str = "   ";
const BRANCH: &str = "├─ ";
const LAST_BRANCH: &str = "└─ ";

/// Connector prefix drawn before a row's name.
///
/// One column per ancestor level below the roots (a vertical line while that
/// ancestor still has siblings to come), then the node's own branch. Roots
/// get no prefix.
pub fn guide_prefix(node: &TreeNode) -> String {
    let Some((_, ancestors)) = node.sibling_has_next.split_last() else {
        return String::new();
    };

    let mut prefix = String::with_capacity((ancestors.len() + 1) * PIPE.len());
    for &continues in ancestors {
        prefix.push_str(if continues { PIPE } else { BLANK });
    }
    prefix.push_str(if node.is_last_child {
        LAST_BRANCH
    } else {
        BRANCH
    });
    prefix
}

/// Plain-text outline of the visible rows: guide, checkbox marker, name.
///
/// Ids missing from `states` render as unselected.
pub fn render_outline(forest: &[TreeNode], states: &HashMap<CategoryId, SelectionState>) -> String {
    let mut out = String::new();
    for node in flatten(forest) {
        let state = states
            .get(node.id())
            .copied()
            .unwrap_or(SelectionState::Unselected);
        out.push_str(&guide_prefix(node));
        out.push_str(state.marker());
        out.push(' ');
        out.push_str(&strip_control_chars(&node.category.name));
        out.push('\n');
    }
    out
}
