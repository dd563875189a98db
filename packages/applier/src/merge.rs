//! Coalescing of adjacent, identically-styled text leaves.
//!
//! After a span edit the boundary leaves often sit next to text with the
//! same effective styling: either direct text siblings, or the edge text
//! of a sibling element that matches tag, classes, and attributes and
//! renders inline. A [`Merge`] collects one maximal run of such leaves;
//! [`Merge::do_merge`] folds them into the first leaf, prunes elements
//! left empty, and re-anchors preserved positions into the survivor.

use applique_dom::{DomTree, NodeId, StyleOracle};
use tracing::trace;

use crate::error::ApplierError;
use crate::position::{DomRange, Position};

/// Sibling elements whose edge text may be bridged: same tag, same class
/// set (order-insensitive), identical non-class attributes, both inline.
pub fn are_elements_mergeable(
    tree: &DomTree,
    oracle: &dyn StyleOracle,
    el1: NodeId,
    el2: NodeId,
) -> bool {
    tree.is_element(el1)
        && tree.is_element(el2)
        && tree.tag(el1) == tree.tag(el2)
        && tree.same_classes(el1, el2)
        && tree.same_non_class_attributes(el1, el2)
        && oracle.is_inline(tree, el1)
        && oracle.is_inline(tree, el2)
}

fn edge_text_descendant(tree: &DomTree, node: NodeId, last: bool) -> Option<NodeId> {
    let mut cur = node;
    while tree.is_element(cur) {
        cur = if last {
            tree.last_child(cur)?
        } else {
            tree.first_child(cur)?
        };
    }
    Some(cur)
}

/// The text leaf adjacent to `text` in the given direction, if one is
/// mergeable with it. `check_parent` permits bridging across the parent
/// element's boundary into a mergeable sibling element.
pub fn adjacent_mergeable_text(
    tree: &DomTree,
    oracle: &dyn StyleOracle,
    text: NodeId,
    forward: bool,
    check_parent: bool,
) -> Option<NodeId> {
    let sibling = if forward {
        tree.next_sibling(text)
    } else {
        tree.prev_sibling(text)
    };
    if let Some(s) = sibling {
        // A non-text sibling blocks merging outright.
        return tree.is_text(s).then_some(s);
    }
    if check_parent {
        let el = tree.parent(text)?;
        let adjacent = if forward {
            tree.next_sibling(el)?
        } else {
            tree.prev_sibling(el)?
        };
        if tree.is_element(adjacent) && are_elements_mergeable(tree, oracle, el, adjacent) {
            return edge_text_descendant(tree, adjacent, !forward);
        }
    }
    None
}

/// One contiguous run of text leaves to be folded into its first member.
#[derive(Debug)]
pub struct Merge {
    pub first_text: NodeId,
    pub text_nodes: Vec<NodeId>,
}

impl Merge {
    /// Seed a merge from a node; an element seed contributes its trailing
    /// text descendant.
    pub fn from_seed(tree: &DomTree, seed: NodeId) -> Option<Self> {
        let first_text = if tree.is_element(seed) {
            edge_text_descendant(tree, seed, true)?
        } else {
            seed
        };
        Some(Self {
            first_text,
            text_nodes: vec![first_text],
        })
    }

    /// Combined length of all leaves currently in the run.
    pub fn total_len(&self, tree: &DomTree) -> usize {
        self.text_nodes.iter().map(|&t| tree.text_len(t)).sum()
    }

    /// Concatenate the run into the first leaf, delete the rest, prune
    /// ancestors left childless, and re-anchor positions from deleted
    /// leaves into the survivor at the accumulated offset.
    pub fn do_merge(
        &self,
        tree: &mut DomTree,
        positions: &mut [Position],
    ) -> Result<String, ApplierError> {
        let mut combined = String::new();
        for (i, &text_node) in self.text_nodes.iter().enumerate() {
            let data = tree.text(text_node).unwrap_or_default().to_string();
            if i > 0 {
                for pos in positions.iter_mut() {
                    if pos.node == text_node {
                        pos.node = self.first_text;
                        pos.offset += combined.len();
                    }
                }
                let mut parent = tree.parent(text_node);
                tree.detach(text_node);
                // Prune the chain of elements this leaf was holding up.
                while let Some(p) = parent {
                    if tree.child_count(p) == 0 && tree.parent(p).is_some() {
                        parent = tree.parent(p);
                        tree.detach(p);
                    } else {
                        break;
                    }
                }
            }
            combined.push_str(&data);
        }
        trace!(leaves = self.text_nodes.len(), "merged text run");
        tree.set_text(self.first_text, &combined)?;
        Ok(combined)
    }
}

/// Normalize the tree around an edited run of leaves: merge each leaf
/// with mergeable content before it, and the last leaf with what follows,
/// then point the edited range at the merged result. Bridging across
/// element boundaries is allowed on apply but not on undo.
pub fn normalize_after_edit(
    tree: &mut DomTree,
    oracle: &dyn StyleOracle,
    leaves: &[NodeId],
    range: &mut DomRange,
    positions: &mut [Position],
    is_undo: bool,
) -> Result<(), ApplierError> {
    let Some((&first_node, rest)) = leaves.split_first() else {
        return Ok(());
    };
    let last_node = rest.last().copied().unwrap_or(first_node);
    let check_parent = !is_undo;

    let mut merges: Vec<Merge> = Vec::new();
    let mut current: Option<usize> = None;
    let mut new_start = Position::new(first_node, 0);
    let mut new_end = Position::new(last_node, tree.text_len(last_node));

    for &leaf in leaves {
        if !tree.is_text(leaf) {
            current = None;
            continue;
        }
        let preceding = adjacent_mergeable_text(tree, oracle, leaf, false, check_parent);
        match preceding {
            Some(preceding) => {
                if current.is_none() {
                    if let Some(merge) = Merge::from_seed(tree, preceding) {
                        merges.push(merge);
                        current = Some(merges.len() - 1);
                    } else {
                        continue;
                    }
                }
                let Some(idx) = current else { continue };
                let merge = &mut merges[idx];
                merge.text_nodes.push(leaf);
                if leaf == first_node {
                    new_start = Position::new(merge.first_text, tree.text_len(merge.first_text));
                }
                if leaf == last_node {
                    new_end = Position::new(merge.first_text, merge.total_len(tree));
                }
            }
            None => current = None,
        }
    }

    // The leaf just past the run may need folding in as well.
    if tree.is_text(last_node) {
        if let Some(next) = adjacent_mergeable_text(tree, oracle, last_node, true, check_parent) {
            match current {
                Some(idx) => merges[idx].text_nodes.push(next),
                None => {
                    if let Some(mut merge) = Merge::from_seed(tree, last_node) {
                        merge.text_nodes.push(next);
                        merges.push(merge);
                    }
                }
            }
        }
    }

    if !merges.is_empty() {
        for merge in &merges {
            merge.do_merge(tree, positions)?;
        }
        range.start = new_start;
        range.end = new_end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use applique_dom::TagStyleOracle;

    #[test]
    fn test_elements_mergeable() {
        let mut tree = DomTree::new("div");
        let oracle = TagStyleOracle::default();
        let a = tree.create_element("span");
        let b = tree.create_element("span");
        tree.set_attribute(a, "class", "x y").unwrap();
        tree.set_attribute(b, "class", "y x").unwrap();
        assert!(are_elements_mergeable(&tree, &oracle, a, b));

        tree.set_attribute(b, "title", "extra").unwrap();
        assert!(!are_elements_mergeable(&tree, &oracle, a, b));
        tree.remove_attribute(b, "title").unwrap();

        let block = tree.create_element("p");
        assert!(!are_elements_mergeable(&tree, &oracle, a, block));
        let other_tag = tree.create_element("em");
        assert!(!are_elements_mergeable(&tree, &oracle, a, other_tag));
    }

    #[test]
    fn test_adjacent_text_sibling() {
        let mut tree = DomTree::new("div");
        let oracle = TagStyleOracle::default();
        let p = tree.create_element("p");
        let t1 = tree.create_text("a");
        let t2 = tree.create_text("b");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t1).unwrap();
        tree.append_child(p, t2).unwrap();
        assert_eq!(
            adjacent_mergeable_text(&tree, &oracle, t1, true, false),
            Some(t2)
        );
        assert_eq!(
            adjacent_mergeable_text(&tree, &oracle, t2, false, false),
            Some(t1)
        );
        assert_eq!(adjacent_mergeable_text(&tree, &oracle, t1, false, false), None);
    }

    #[test]
    fn test_adjacent_across_mergeable_elements() {
        let mut tree = DomTree::new("div");
        let oracle = TagStyleOracle::default();
        let p = tree.create_element("p");
        let s1 = tree.create_element("span");
        let s2 = tree.create_element("span");
        let t1 = tree.create_text("left");
        let t2 = tree.create_text("right");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, s1).unwrap();
        tree.append_child(p, s2).unwrap();
        tree.append_child(s1, t1).unwrap();
        tree.append_child(s2, t2).unwrap();

        assert_eq!(
            adjacent_mergeable_text(&tree, &oracle, t1, true, true),
            Some(t2)
        );
        assert_eq!(
            adjacent_mergeable_text(&tree, &oracle, t2, false, true),
            Some(t1)
        );
        // Bridging disabled: the element boundary blocks the merge.
        assert_eq!(adjacent_mergeable_text(&tree, &oracle, t1, true, false), None);
        // Differing classes block it too.
        tree.add_class(s2, "hl").unwrap();
        assert_eq!(adjacent_mergeable_text(&tree, &oracle, t1, true, true), None);
    }

    #[test]
    fn test_do_merge_concatenates_and_reanchors() {
        let mut tree = DomTree::new("div");
        let p = tree.create_element("p");
        let t1 = tree.create_text("ab");
        let t2 = tree.create_text("cd");
        let t3 = tree.create_text("ef");
        tree.append_child(tree.root(), p).unwrap();
        for t in [t1, t2, t3] {
            tree.append_child(p, t).unwrap();
        }
        let merge = Merge {
            first_text: t1,
            text_nodes: vec![t1, t2, t3],
        };
        let mut positions = vec![Position::new(t2, 1), Position::new(t3, 2)];
        let combined = merge.do_merge(&mut tree, &mut positions).unwrap();
        assert_eq!(combined, "abcdef");
        assert_eq!(tree.text(t1), Some("abcdef"));
        assert_eq!(tree.children(p), &[t1]);
        assert_eq!(positions[0], Position::new(t1, 3));
        assert_eq!(positions[1], Position::new(t1, 6));
    }

    #[test]
    fn test_do_merge_prunes_emptied_wrappers() {
        let mut tree = DomTree::new("div");
        let p = tree.create_element("p");
        let t1 = tree.create_text("a");
        let outer = tree.create_element("span");
        let inner = tree.create_element("span");
        let t2 = tree.create_text("b");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t1).unwrap();
        tree.append_child(p, outer).unwrap();
        tree.append_child(outer, inner).unwrap();
        tree.append_child(inner, t2).unwrap();

        let merge = Merge {
            first_text: t1,
            text_nodes: vec![t1, t2],
        };
        merge.do_merge(&mut tree, &mut []).unwrap();
        assert_eq!(tree.text(t1), Some("ab"));
        // Both nested wrappers emptied out and were pruned.
        assert_eq!(tree.children(p), &[t1]);
        assert_eq!(tree.parent(inner), None);
        assert_eq!(tree.parent(outer), None);
    }

    #[test]
    fn test_normalize_after_edit_merges_both_sides() {
        let mut tree = DomTree::new("div");
        let oracle = TagStyleOracle::default();
        let p = tree.create_element("p");
        let before = tree.create_text("A");
        let edited = tree.create_text("B");
        let after = tree.create_text("C");
        tree.append_child(tree.root(), p).unwrap();
        for t in [before, edited, after] {
            tree.append_child(p, t).unwrap();
        }
        let mut range = DomRange::new(Position::new(edited, 0), Position::new(edited, 1));
        normalize_after_edit(&mut tree, &oracle, &[edited], &mut range, &mut [], true).unwrap();
        assert_eq!(tree.text(before), Some("ABC"));
        assert_eq!(tree.children(p), &[before]);
        // The range now addresses "B" inside the merged leaf.
        assert_eq!(range.start, Position::new(before, 1));
        assert_eq!(range.end, Position::new(before, 2));
    }

    #[test]
    fn test_normalize_after_edit_no_neighbours() {
        let mut tree = DomTree::new("div");
        let oracle = TagStyleOracle::default();
        let p = tree.create_element("p");
        let only = tree.create_text("alone");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, only).unwrap();
        let mut range = DomRange::new(Position::new(only, 0), Position::new(only, 5));
        let unchanged = range;
        normalize_after_edit(&mut tree, &oracle, &[only], &mut range, &mut [], false).unwrap();
        assert_eq!(range, unchanged);
        assert_eq!(tree.children(p), &[only]);
    }
}
