use super::types::TreeNode;

/// Pre-order walk of the forest yielding one entry per visible row.
///
/// A node's children are emitted only when it is expanded and has children
/// materialized. The builder already gates on expansion, but the check is
/// repeated here so trees built under another policy still flatten correctly.
pub fn flatten(nodes: &[TreeNode]) -> Vec<&TreeNode> {
    let mut rows = Vec::with_capacity(nodes.len());
    push_visible(nodes, &mut rows);
    rows
}

fn push_visible<'n>(nodes: &'n [TreeNode], rows: &mut Vec<&'n TreeNode>) {
    for node in nodes {
        rows.push(node);
        if node.is_expanded && !node.children.is_empty() {
            push_visible(&node.children, rows);
        }
    }
}
