//! Locations and spans in the tree.
//!
//! A [`Position`] is a `(node, offset)` address: a character offset inside
//! a text leaf, or a child-slot index inside an element. A [`DomRange`] is
//! an ordered pair of positions. Both are plain value types owned by
//! callers; the core reads and rewrites them but never invalidates one
//! silently.

use std::cmp::Ordering;

use applique_dom::{DomTree, NodeId};

use crate::error::ApplierError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A span of the document: `start` never follows `end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Position,
    pub end: Position,
}

impl DomRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(&self) -> bool {
        self.start == self.end
    }

    /// The range covering exactly `node`, as slots in its parent.
    pub fn select_node(tree: &DomTree, node: NodeId) -> Option<Self> {
        node_extent(tree, node).map(|(start, end)| Self::new(start, end))
    }

    /// Boundary-inclusive point containment.
    pub fn contains_point(&self, tree: &DomTree, pos: Position) -> bool {
        compare_positions(tree, self.start, pos) != Ordering::Greater
            && compare_positions(tree, pos, self.end) != Ordering::Greater
    }

    /// True when the node's whole extent lies within the range.
    pub fn contains_node(&self, tree: &DomTree, node: NodeId) -> bool {
        match node_extent(tree, node) {
            Some((ns, ne)) => {
                compare_positions(tree, self.start, ns) != Ordering::Greater
                    && compare_positions(tree, ne, self.end) != Ordering::Greater
            }
            None => false,
        }
    }

    /// Move the end boundary to the slot just after `node`.
    pub fn set_end_after(&mut self, tree: &DomTree, node: NodeId) -> Result<(), ApplierError> {
        let (_, after) = node_extent(tree, node).ok_or(ApplierError::MissingParent)?;
        self.end = after;
        Ok(())
    }
}

/// The `(before, after)` slot positions of a node in its parent.
pub fn node_extent(tree: &DomTree, node: NodeId) -> Option<(Position, Position)> {
    let parent = tree.parent(node)?;
    let index = tree.node_index(node);
    Some((
        Position::new(parent, index),
        Position::new(parent, index + 1),
    ))
}

/// Child-index path from the root to this position. Lexicographic order
/// over these keys is document order for boundary points.
fn position_key(tree: &DomTree, pos: Position) -> Vec<usize> {
    let mut key = Vec::new();
    let mut cur = pos.node;
    while let Some(parent) = tree.parent(cur) {
        key.push(tree.node_index(cur));
        cur = parent;
    }
    key.reverse();
    key.push(pos.offset);
    key
}

/// Document-order comparison of two boundary points.
pub fn compare_positions(tree: &DomTree, a: Position, b: Position) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    position_key(tree, a).cmp(&position_key(tree, b))
}

/// Deepest node containing both boundaries of the range.
pub fn common_container(tree: &DomTree, range: &DomRange) -> NodeId {
    if range.start.node == range.end.node {
        return range.start.node;
    }
    let chain: Vec<NodeId> = tree.self_and_ancestors(range.start.node).collect();
    for node in tree.self_and_ancestors(range.end.node) {
        if chain.contains(&node) {
            return node;
        }
    }
    range.start.node
}

/// The part of a text leaf's character data the range actually covers.
/// Empty when the range merely touches the leaf's boundary.
pub fn selected_text<'t>(tree: &'t DomTree, range: &DomRange, text: NodeId) -> &'t str {
    let Some(data) = tree.text(text) else {
        return "";
    };
    let len = data.len();
    let leaf_start = Position::new(text, 0);
    let leaf_end = Position::new(text, len);
    if compare_positions(tree, range.end, leaf_start) != Ordering::Greater {
        return "";
    }
    if compare_positions(tree, range.start, leaf_end) != Ordering::Less {
        return "";
    }
    let from = if range.start.node == text {
        range.start.offset.min(len)
    } else {
        0
    };
    let to = if range.end.node == text {
        range.end.offset.min(len)
    } else {
        len
    };
    data.get(from..to).unwrap_or("")
}

fn intersects_or_touches(tree: &DomTree, a: &DomRange, b: &DomRange) -> bool {
    compare_positions(tree, a.start, b.end) != Ordering::Greater
        && compare_positions(tree, b.start, a.end) != Ordering::Greater
}

fn union(tree: &DomTree, a: DomRange, b: DomRange) -> DomRange {
    let start = if compare_positions(tree, a.start, b.start) == Ordering::Greater {
        b.start
    } else {
        a.start
    };
    let end = if compare_positions(tree, a.end, b.end) == Ordering::Less {
        b.end
    } else {
        a.end
    };
    DomRange::new(start, end)
}

/// Sort ranges by document order and merge any that intersect or touch,
/// yielding a minimal disjoint ordered set.
pub fn normalize_ranges(tree: &DomTree, ranges: &[DomRange]) -> Vec<DomRange> {
    if ranges.is_empty() {
        return Vec::new();
    }
    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| compare_positions(tree, a.start, b.start));
    let mut out = Vec::new();
    let mut merged = sorted[0];
    for &range in &sorted[1..] {
        if intersects_or_touches(tree, &range, &merged) {
            merged = union(tree, merged, range);
        } else {
            out.push(merged);
            merged = range;
        }
    }
    out.push(merged);
    out
}

/// Flatten ranges into their boundary positions, two per range, for
/// tracking through mutations.
pub fn range_boundaries(ranges: &[DomRange]) -> Vec<Position> {
    let mut positions = Vec::with_capacity(ranges.len() * 2);
    for range in ranges {
        positions.push(range.start);
        positions.push(range.end);
    }
    positions
}

/// Rebuild ranges from boundary positions updated by mutations.
pub fn restore_ranges(ranges: &mut [DomRange], positions: &[Position]) {
    for (i, range) in ranges.iter_mut().enumerate() {
        range.start = positions[i * 2];
        range.end = positions[i * 2 + 1];
    }
}
