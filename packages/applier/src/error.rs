//! Error types for the applier core.
//!
//! Contract violations surface immediately as errors; no-op conditions
//! (a split point already on a boundary, a span selecting nothing) are
//! ordinary return values and never error.

use applique_dom::DomError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplierError {
    #[error("tree error: {0}")]
    Dom(#[from] DomError),

    #[error("cannot split inside character data (offset {offset} of {len})")]
    SplitInsideTextData { offset: usize, len: usize },

    #[error("offset {offset} is not a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("node is not contained in the split root's subtree")]
    NotInSubtree,

    #[error("operation requires a node attached to a parent")]
    MissingParent,

    #[error("marker has no container tag to create wrappers with")]
    MissingContainerTag,
}
