//! What a span actually selects.
//!
//! A text leaf counts only when the span's intersection with it yields
//! non-empty character data; merely touching its boundary selects
//! nothing. Atomic leaves (embedded media) count when the span overlaps
//! them at all. The resulting ordered leaf list is the unit of work for
//! apply, undo, and the applied-state query.

use std::cmp::Ordering;

use applique_dom::{serializer, DomTree, NodeId, StyleOracle, WhiteSpace};

use crate::position::{
    common_container, compare_positions, node_extent, selected_text, DomRange,
};

/// Does the range cover any characters of this text leaf?
pub fn selects_any_text(tree: &DomTree, range: &DomRange, text: NodeId) -> bool {
    !selected_text(tree, range, text).is_empty()
}

/// Ordered leaves the range effectively intersects.
pub fn effective_leaves(tree: &DomTree, range: &DomRange) -> Vec<NodeId> {
    let container = common_container(tree, range);
    if tree.is_text(container) {
        return if selects_any_text(tree, range, container) {
            vec![container]
        } else {
            Vec::new()
        };
    }
    let mut out = Vec::new();
    for node in tree.descendants(container) {
        if tree.is_text(node) {
            if selects_any_text(tree, range, node) {
                out.push(node);
            }
        } else if tree.is_atomic_leaf(node) {
            if let Some((start, end)) = node_extent(tree, node) {
                let overlaps = compare_positions(tree, start, range.end) == Ordering::Less
                    && compare_positions(tree, end, range.start) == Ordering::Greater;
                if overlaps {
                    out.push(node);
                }
            }
        }
    }
    out
}

/// Whitespace-only character data that would not render where it sits:
/// nothing visible comes of wrapping it. `pre`-like parents always
/// render their whitespace; otherwise only whitespace adjacent to a
/// non-inline sibling is unrendered.
pub fn is_unrendered_whitespace(
    tree: &DomTree,
    oracle: &dyn StyleOracle,
    text: NodeId,
) -> bool {
    let Some(data) = tree.text(text) else {
        return false;
    };
    if data.is_empty() {
        return true;
    }
    if data
        .chars()
        .any(|c| !matches!(c, '\r' | '\n' | '\t' | '\x0C' | ' ' | '\u{200B}'))
    {
        return false;
    }
    if let Some(parent) = tree.parent(text) {
        match oracle.white_space(tree, parent) {
            WhiteSpace::Pre | WhiteSpace::PreWrap => return false,
            WhiteSpace::PreLine => {
                if data.contains(['\r', '\n']) {
                    return false;
                }
            }
            WhiteSpace::Normal => {}
        }
    }
    let non_inline = |n: Option<NodeId>| {
        n.map_or(false, |n| tree.is_element(n) && !oracle.is_inline(tree, n))
    };
    non_inline(tree.prev_sibling(text)) || non_inline(tree.next_sibling(text))
}

/// Serialize the content a range selects, the way extracting it into a
/// fragment would look: partial leaves clipped, straddled elements
/// re-opened around their selected children.
pub fn range_markup(tree: &DomTree, range: &DomRange) -> String {
    let container = common_container(tree, range);
    if tree.is_text(container) {
        return serializer::escape_text(selected_text(tree, range, container));
    }
    let mut out = String::new();
    write_selected_children(tree, range, container, &mut out);
    out
}

fn write_selected_children(tree: &DomTree, range: &DomRange, parent: NodeId, out: &mut String) {
    for &child in tree.children(parent) {
        let Some((start, end)) = node_extent(tree, child) else {
            continue;
        };
        if compare_positions(tree, end, range.start) != Ordering::Greater {
            continue;
        }
        if compare_positions(tree, start, range.end) != Ordering::Less {
            break;
        }
        if range.contains_node(tree, child) {
            out.push_str(&serializer::outer_markup(tree, child));
        } else if tree.is_text(child) {
            out.push_str(&serializer::escape_text(selected_text(tree, range, child)));
        } else {
            out.push_str(&serializer::start_tag(tree, child));
            write_selected_children(tree, range, child, out);
            out.push_str(&serializer::end_tag(tree, child));
        }
    }
}
