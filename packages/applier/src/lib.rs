//! # Applique Applier
//!
//! Applies and removes a structural marker (an element wrapper carrying
//! a tag, class set, and attribute set) over arbitrary spans of a
//! mutable tree, while keeping every other live position in the
//! document pointing at the same logical content.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ position: locations, spans, document order  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ mutator: moves that re-target positions     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ split / merge / effective: boundary surgery │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ applier: apply / undo / toggle / queries    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use applique_applier::{Applier, DomRange, Marker, Position};
//! use applique_dom::{DomTree, TagStyleOracle};
//!
//! let mut tree = DomTree::new("div");
//! let p = tree.create_element("p");
//! let text = tree.create_text("Hello world");
//! tree.append_child(tree.root(), p).unwrap();
//! tree.append_child(p, text).unwrap();
//!
//! let applier = Applier::new(
//!     Marker::new("mark").with_class("hl"),
//!     Box::new(TagStyleOracle::default()),
//! );
//! let mut range = DomRange::new(Position::new(text, 3), Position::new(text, 8));
//! applier.apply_to_range(&mut tree, &mut range, &mut []).unwrap();
//! assert!(applier.is_applied_to_range(&tree, &range));
//! ```

mod applier;
mod effective;
mod error;
mod marker;
mod merge;
mod mutator;
mod position;
mod selection;
mod split;

pub use applier::Applier;
pub use effective::{effective_leaves, is_unrendered_whitespace, range_markup, selects_any_text};
pub use error::ApplierError;
pub use marker::{Facet, Marker};
pub use merge::{adjacent_mergeable_text, are_elements_mergeable, normalize_after_edit, Merge};
pub use mutator::{
    move_children_preserving_positions, move_position, move_preserving_positions,
    replace_with_own_children_preserving_positions, split_range_boundaries, split_text_node,
};
pub use position::{
    common_container, compare_positions, node_extent, normalize_ranges, range_boundaries,
    restore_ranges, selected_text, DomRange, Position,
};
pub use selection::{SelectionAdapter, VecSelection};
pub use split::{is_split_point, split_node_at};

// Re-export the tree types for convenience.
pub use applique_dom::{DomTree, NodeId};
