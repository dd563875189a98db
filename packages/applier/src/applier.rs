//! Span-level marker application.
//!
//! The [`Applier`] owns a [`Marker`] description and a [`StyleOracle`]
//! and orchestrates the lower layers: boundary splitting, effective-leaf
//! selection, wrapping or facet reuse, ancestor splitting and unwrapping
//! on undo, and post-edit normalization. Every operation threads the
//! caller's other spans through the mutation primitives so their
//! positions survive the edit.

use applique_dom::{DomTree, NodeId, StyleOracle, ATOMIC_TAGS};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::effective::{
    effective_leaves, is_unrendered_whitespace, range_markup, selects_any_text,
};
use crate::error::ApplierError;
use crate::marker::{parse_style, Marker};
use crate::merge::normalize_after_edit;
use crate::mutator::{replace_with_own_children_preserving_positions, split_range_boundaries};
use crate::position::{
    common_container, node_extent, range_boundaries, restore_ranges, DomRange, Position,
};
use crate::split::split_node_at;

static ATOMIC_MARKUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)<(?:{})\b", ATOMIC_TAGS.join("|")))
        .expect("atomic markup pattern is valid")
});

static MARKUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Applies, removes, toggles, and queries one marker over spans of a
/// tree.
pub struct Applier {
    marker: Marker,
    oracle: Box<dyn StyleOracle>,
}

impl Applier {
    /// The oracle is injected here by the host; there is no global
    /// fallback to probe for one.
    pub fn new(marker: Marker, oracle: Box<dyn StyleOracle>) -> Self {
        Self { marker, oracle }
    }

    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    /// Element carrying this marker: tag in the marker's tag set (empty
    /// set matches any tag), every required class, every required
    /// attribute; each check independently bypassable.
    pub fn is_valid(&self, tree: &DomTree, node: NodeId) -> bool {
        self.is_valid_tag(tree, node)
            && self.has_classes(tree, node)
            && self.has_attributes(tree, node)
    }

    fn is_valid_tag(&self, tree: &DomTree, node: NodeId) -> bool {
        tree.tag(node).map_or(false, |t| self.marker.tag_matches(t))
    }

    fn has_classes(&self, tree: &DomTree, node: NodeId) -> bool {
        self.marker.ignore_classes
            || self
                .marker
                .classes
                .iter()
                .all(|c| tree.has_class(node, c))
    }

    fn has_attributes(&self, tree: &DomTree, node: NodeId) -> bool {
        self.marker.ignore_attributes
            || self
                .marker
                .attributes
                .iter()
                .all(|(name, _)| tree.has_attribute(node, name))
    }

    /// The node itself or its nearest ancestor matching the marker.
    pub fn self_or_matching_ancestor(&self, tree: &DomTree, node: NodeId) -> Option<NodeId> {
        tree.self_and_ancestors(node).find(|&n| self.is_valid(tree, n))
    }

    fn is_modifiable(&self, tree: &DomTree, node: NodeId) -> bool {
        !self.marker.apply_to_editable_only || tree.is_editable(node)
    }

    fn is_ignorable_whitespace(&self, tree: &DomTree, node: NodeId) -> bool {
        self.marker.ignore_white_space
            && tree.is_text(node)
            && is_unrendered_whitespace(tree, self.oracle.as_ref(), node)
    }

    /// May this matching element be removed outright on undo? Only when
    /// stripping the marker's contribution would leave it fully bare:
    /// no foreign classes, no foreign attributes, no foreign style
    /// declarations.
    fn is_removable(&self, tree: &DomTree, node: NodeId) -> bool {
        if self.marker.tags.is_empty()
            || !self.is_valid_tag(tree, node)
            || !self.has_classes(tree, node)
            || !self.has_attributes(tree, node)
            || !self.is_modifiable(tree, node)
        {
            return false;
        }
        let foreign_class = tree
            .classes(node)
            .iter()
            .any(|c| !self.marker.classes.iter().any(|mc| mc.as_str() == *c));
        if foreign_class {
            return false;
        }
        let foreign_style = tree.attribute(node, "style").map_or(false, |value| {
            parse_style(value)
                .iter()
                .any(|(prop, _)| !self.marker.styles.iter().any(|(mp, _)| mp == prop))
        });
        if foreign_style {
            return false;
        }
        let mut exceptions: Vec<&str> = self
            .marker
            .attributes
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        exceptions.push("style");
        !tree.has_non_class_attributes(node, &exceptions)
    }

    // ------------------------------------------------------------------
    // Leaf-level edits
    // ------------------------------------------------------------------

    fn create_container(&self, tree: &mut DomTree) -> Result<NodeId, ApplierError> {
        let tag = self
            .marker
            .tag
            .as_deref()
            .ok_or(ApplierError::MissingContainerTag)?;
        let element = tree.create_element(tag);
        for facet in self.marker.facets() {
            facet.apply(tree, element)?;
        }
        Ok(element)
    }

    fn apply_to_leaf(&self, tree: &mut DomTree, leaf: NodeId) -> Result<(), ApplierError> {
        let parent = tree.parent(leaf).ok_or(ApplierError::MissingParent)?;
        let parent_is_own_tag = tree
            .tag(parent)
            .map_or(false, |t| self.marker.tag_in_set(t));
        if tree.child_count(parent) == 1 && parent_is_own_tag && self.marker.use_existing_elements
        {
            // The leaf's sole parent is already one of ours: fold the
            // marker's facets onto it instead of nesting wrappers.
            for facet in self.marker.facets() {
                facet.apply(tree, parent)?;
            }
        } else {
            let wrapper = self.create_container(tree)?;
            let index = tree.node_index(leaf);
            tree.insert_child(parent, index, wrapper)?;
            tree.append_child(wrapper, leaf)?;
        }
        Ok(())
    }

    fn undo_to_leaf(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
        mut ancestor: NodeId,
        positions: &mut [Position],
    ) -> Result<(), ApplierError> {
        if !range.contains_node(tree, ancestor) {
            // The marker element sticks out of the span: split off the
            // parts the span does not cover so only the overlap is
            // stripped.
            let ancestor_range = DomRange::select_node(tree, ancestor)
                .ok_or(ApplierError::MissingParent)?;
            if ancestor_range.contains_point(tree, range.end) {
                split_node_at(tree, ancestor, range.end.node, range.end.offset, positions)?;
                range.set_end_after(tree, ancestor)?;
            }
            if ancestor_range.contains_point(tree, range.start) {
                ancestor =
                    split_node_at(tree, ancestor, range.start.node, range.start.offset, positions)?;
            }
        }
        if self.is_removable(tree, ancestor) {
            replace_with_own_children_preserving_positions(tree, ancestor, positions)?;
        } else {
            for facet in self.marker.facets() {
                facet.remove(tree, ancestor)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Span operations
    // ------------------------------------------------------------------

    fn apply_core(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
        positions: &mut [Position],
    ) -> Result<(), ApplierError> {
        split_range_boundaries(tree, range, positions)?;
        let leaves = effective_leaves(tree, range);
        let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
            return Ok(());
        };
        debug!("applying marker to {} effective leaves", leaves.len());
        for &leaf in &leaves {
            if !self.is_ignorable_whitespace(tree, leaf) && self.is_modifiable(tree, leaf) {
                self.apply_to_leaf(tree, leaf)?;
            }
        }
        // The span widens to the full extent of the edited run.
        *range = leaf_run_range(tree, first, last)?;
        if self.marker.normalize {
            normalize_after_edit(tree, self.oracle.as_ref(), &leaves, range, positions, false)?;
        }
        Ok(())
    }

    fn undo_core(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
        positions: &mut [Position],
    ) -> Result<(), ApplierError> {
        split_range_boundaries(tree, range, positions)?;
        let leaves = effective_leaves(tree, range);
        let (Some(&first), Some(&last)) = (leaves.first(), leaves.last()) else {
            return Ok(());
        };
        debug!("removing marker from {} effective leaves", leaves.len());
        for &leaf in &leaves {
            if let Some(ancestor) = self.self_or_matching_ancestor(tree, leaf) {
                if self.is_modifiable(tree, leaf) {
                    self.undo_to_leaf(tree, range, ancestor, positions)?;
                }
            }
            *range = leaf_run_range(tree, first, last)?;
        }
        if self.marker.normalize {
            normalize_after_edit(tree, self.oracle.as_ref(), &leaves, range, positions, true)?;
        }
        Ok(())
    }

    /// Apply the marker to a span. The span is rewritten to its new
    /// extent; every range in `preserve` is kept pointing at the same
    /// logical content.
    pub fn apply_to_range(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
        preserve: &mut [DomRange],
    ) -> Result<(), ApplierError> {
        let mut positions = range_boundaries(preserve);
        let mut work = *range;
        self.apply_core(tree, &mut work, &mut positions)?;
        restore_ranges(preserve, &positions);
        *range = work;
        Ok(())
    }

    /// Remove the marker from a span, splitting any matching ancestor
    /// the span only partially covers.
    pub fn undo_to_range(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
        preserve: &mut [DomRange],
    ) -> Result<(), ApplierError> {
        let mut positions = range_boundaries(preserve);
        let mut work = *range;
        self.undo_core(tree, &mut work, &mut positions)?;
        restore_ranges(preserve, &positions);
        *range = work;
        Ok(())
    }

    /// Apply over many spans: processed in reverse document order with
    /// the whole set mutually preserved, then every span is restored
    /// from its tracked boundaries.
    pub fn apply_to_ranges(
        &self,
        tree: &mut DomTree,
        ranges: &mut [DomRange],
    ) -> Result<(), ApplierError> {
        let mut positions = range_boundaries(ranges);
        for i in (0..ranges.len()).rev() {
            let mut work = DomRange::new(positions[i * 2], positions[i * 2 + 1]);
            self.apply_core(tree, &mut work, &mut positions)?;
        }
        restore_ranges(ranges, &positions);
        Ok(())
    }

    /// Remove over many spans; see [`Applier::apply_to_ranges`].
    pub fn undo_to_ranges(
        &self,
        tree: &mut DomTree,
        ranges: &mut [DomRange],
    ) -> Result<(), ApplierError> {
        let mut positions = range_boundaries(ranges);
        for i in (0..ranges.len()).rev() {
            let mut work = DomRange::new(positions[i * 2], positions[i * 2 + 1]);
            self.undo_core(tree, &mut work, &mut positions)?;
        }
        restore_ranges(ranges, &positions);
        Ok(())
    }

    /// Is the marker in effect over the whole span?
    ///
    /// A collapsed span asks whether its anchor sits under a matching
    /// element. A non-collapsed span fails as soon as any selected,
    /// modifiable, non-ignorable text leaf lacks a matching ancestor;
    /// it also fails when it selects an atomic leaf, or when its content
    /// renders as nothing.
    pub fn is_applied_to_range(&self, tree: &DomTree, range: &DomRange) -> bool {
        let container = common_container(tree, range);
        if range.collapsed() {
            return self.self_or_matching_ancestor(tree, container).is_some();
        }
        let text_leaves: Vec<NodeId> = if tree.is_text(container) {
            vec![container]
        } else {
            tree.descendants(container)
                .filter(|&n| tree.is_text(n))
                .collect()
        };
        for leaf in text_leaves {
            if self.is_ignorable_whitespace(tree, leaf) {
                continue;
            }
            if selects_any_text(tree, range, leaf)
                && self.is_modifiable(tree, leaf)
                && self.self_or_matching_ancestor(tree, leaf).is_none()
            {
                return false;
            }
        }
        let markup = range_markup(tree, range);
        if ATOMIC_MARKUP.is_match(&markup) {
            return false;
        }
        if MARKUP_TAG.replace_all(&markup, "").trim().is_empty() {
            return false;
        }
        true
    }

    /// All spans marked; an empty set is never considered marked.
    pub fn is_applied_to_ranges(&self, tree: &DomTree, ranges: &[DomRange]) -> bool {
        !ranges.is_empty() && ranges.iter().all(|r| self.is_applied_to_range(tree, r))
    }

    pub fn toggle_range(
        &self,
        tree: &mut DomTree,
        range: &mut DomRange,
    ) -> Result<(), ApplierError> {
        if self.is_applied_to_range(tree, range) {
            self.undo_to_range(tree, range, &mut [])
        } else {
            self.apply_to_range(tree, range, &mut [])
        }
    }

    pub fn toggle_ranges(
        &self,
        tree: &mut DomTree,
        ranges: &mut [DomRange],
    ) -> Result<(), ApplierError> {
        if self.is_applied_to_ranges(tree, ranges) {
            self.undo_to_ranges(tree, ranges)
        } else {
            self.apply_to_ranges(tree, ranges)
        }
    }
}

/// Span covering a run of leaves: from the start of the first to the end
/// of the last.
fn leaf_run_range(
    tree: &DomTree,
    first: NodeId,
    last: NodeId,
) -> Result<DomRange, ApplierError> {
    let start = if tree.is_text(first) {
        Position::new(first, 0)
    } else {
        node_extent(tree, first)
            .ok_or(ApplierError::MissingParent)?
            .0
    };
    let end = if tree.is_text(last) {
        Position::new(last, tree.text_len(last))
    } else {
        node_extent(tree, last)
            .ok_or(ApplierError::MissingParent)?
            .1
    };
    Ok(DomRange::new(start, end))
}
