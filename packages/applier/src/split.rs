//! Ancestor splitting.
//!
//! Turns a location inside a subtree into a clean boundary between
//! siblings by cloning each ancestor on the path and relocating the
//! trailing children into the clone, one level at a time, until the
//! stated root has itself been split (or the location turns out to
//! already be a boundary all the way up).

use applique_dom::{DomTree, NodeId};
use tracing::trace;

use crate::error::ApplierError;
use crate::mutator::move_preserving_positions;
use crate::position::Position;

/// Is this location strictly between two siblings' worth of content?
/// Text edges only count when a sibling exists on that side; interior
/// text offsets always do.
pub fn is_split_point(tree: &DomTree, node: NodeId, offset: usize) -> bool {
    if tree.is_text(node) {
        if offset == 0 {
            tree.prev_sibling(node).is_some()
        } else if offset == tree.text_len(node) {
            tree.next_sibling(node).is_some()
        } else {
            true
        }
    } else {
        offset > 0 && offset < tree.child_count(node)
    }
}

/// Split `node`'s subtree at the location `(descendant, descendant_offset)`.
///
/// Character offsets must sit on the leaf's edges (0 or its length); the
/// caller resolves interior offsets first, usually with
/// [`crate::mutator::split_range_boundaries`]. When the location is
/// interior to `node` itself, `node` is split and the new right-hand
/// sibling returned; a location that is already a boundary at every
/// level returns `node` unchanged.
pub fn split_node_at(
    tree: &mut DomTree,
    node: NodeId,
    descendant: NodeId,
    descendant_offset: usize,
    positions: &mut [Position],
) -> Result<NodeId, ApplierError> {
    if descendant != node && !tree.is_ancestor_of(node, descendant) {
        return Err(ApplierError::NotInSubtree);
    }
    let split_at_start = descendant_offset == 0;

    let (descendant, descendant_offset) = if tree.is_text(descendant) {
        let len = tree.text_len(descendant);
        if descendant == node {
            // Nothing above the leaf to split within this root.
            return if descendant_offset == 0 || descendant_offset == len {
                Ok(node)
            } else {
                Err(ApplierError::SplitInsideTextData {
                    offset: descendant_offset,
                    len,
                })
            };
        }
        let index = tree.node_index(descendant);
        let slot = if descendant_offset == 0 {
            index
        } else if descendant_offset == len {
            index + 1
        } else {
            return Err(ApplierError::SplitInsideTextData {
                offset: descendant_offset,
                len,
            });
        };
        let parent = tree.parent(descendant).ok_or(ApplierError::MissingParent)?;
        (parent, slot)
    } else {
        (descendant, descendant_offset)
    };

    if is_split_point(tree, descendant, descendant_offset) {
        let parent = tree.parent(descendant).ok_or(ApplierError::MissingParent)?;
        let new_node = tree.clone_shallow(descendant);
        tree.remove_attribute(new_node, "id")?;
        trace!(offset = descendant_offset, "splitting element");

        let mut new_child_index = 0;
        while let Some(child) = tree.child(descendant, descendant_offset) {
            move_preserving_positions(tree, child, new_node, new_child_index, positions)?;
            new_child_index += 1;
        }
        let after = tree.node_index(descendant) + 1;
        move_preserving_positions(tree, new_node, parent, after, positions)?;

        if descendant == node {
            Ok(new_node)
        } else {
            let index = tree.node_index(new_node);
            split_node_at(tree, node, parent, index, positions)
        }
    } else if node != descendant {
        // Boundary at this level; carry the split point up one ancestor.
        let parent = tree.parent(descendant).ok_or(ApplierError::MissingParent)?;
        let mut index = tree.node_index(descendant);
        if !split_at_start {
            index += 1;
        }
        split_node_at(tree, node, parent, index, positions)
    } else {
        Ok(node)
    }
}
