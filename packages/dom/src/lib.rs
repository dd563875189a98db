//! # Applique DOM
//!
//! The document tree the applier core operates on: an arena of element
//! and text nodes with ordered attributes, a distinguished multi-valued
//! `class` attribute, and parent back-references for traversal.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ dom: arena tree + markup serializer         │
//! │  - Element/Text nodes behind NodeId handles │
//! │  - Structural primitives (insert/detach)    │
//! │  - Editable-region detection                │
//! │  - StyleOracle seam for layout knowledge    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ applier: span-level marker application      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Everything is synchronous and single-threaded; the tree is shared only
//! within one call stack.

mod arena;
mod error;
pub mod serializer;
mod style;

pub use arena::{Descendants, DomTree, NodeId, ATOMIC_TAGS};
pub use error::DomError;
pub use style::{StyleOracle, TagStyleOracle, WhiteSpace};
