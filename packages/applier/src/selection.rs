//! Selection-level conveniences.
//!
//! A host's native selection object is reached through
//! [`SelectionAdapter`]: it hands the applier an ordered list of ranges
//! and takes the rewritten list back. The methods here are thin
//! pass-throughs over the range-level operations.

use applique_dom::DomTree;

use crate::applier::Applier;
use crate::error::ApplierError;
use crate::position::DomRange;

/// Bridge between a native multi-range selection and the ordered range
/// list the core operates on.
pub trait SelectionAdapter {
    fn ranges(&self, tree: &DomTree) -> Vec<DomRange>;

    fn set_ranges(&mut self, tree: &DomTree, ranges: Vec<DomRange>);
}

/// The simplest possible selection: a plain list of ranges. Handy in
/// tests and for hosts without a native selection object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VecSelection {
    pub ranges: Vec<DomRange>,
}

impl VecSelection {
    pub fn new(ranges: Vec<DomRange>) -> Self {
        Self { ranges }
    }
}

impl SelectionAdapter for VecSelection {
    fn ranges(&self, _tree: &DomTree) -> Vec<DomRange> {
        self.ranges.clone()
    }

    fn set_ranges(&mut self, _tree: &DomTree, ranges: Vec<DomRange>) {
        self.ranges = ranges;
    }
}

impl Applier {
    pub fn apply_to_selection<S: SelectionAdapter>(
        &self,
        tree: &mut DomTree,
        selection: &mut S,
    ) -> Result<(), ApplierError> {
        let mut ranges = selection.ranges(tree);
        self.apply_to_ranges(tree, &mut ranges)?;
        selection.set_ranges(tree, ranges);
        Ok(())
    }

    pub fn undo_to_selection<S: SelectionAdapter>(
        &self,
        tree: &mut DomTree,
        selection: &mut S,
    ) -> Result<(), ApplierError> {
        let mut ranges = selection.ranges(tree);
        self.undo_to_ranges(tree, &mut ranges)?;
        selection.set_ranges(tree, ranges);
        Ok(())
    }

    pub fn is_applied_to_selection<S: SelectionAdapter>(
        &self,
        tree: &DomTree,
        selection: &S,
    ) -> bool {
        self.is_applied_to_ranges(tree, &selection.ranges(tree))
    }

    pub fn toggle_selection<S: SelectionAdapter>(
        &self,
        tree: &mut DomTree,
        selection: &mut S,
    ) -> Result<(), ApplierError> {
        if self.is_applied_to_selection(tree, selection) {
            self.undo_to_selection(tree, selection)
        } else {
            self.apply_to_selection(tree, selection)
        }
    }
}
