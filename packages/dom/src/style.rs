//! Rendered-style queries.
//!
//! The tree itself knows nothing about layout. Whether an element renders
//! inline, and how whitespace inside it collapses, is the host's business:
//! implementations of [`StyleOracle`] are injected at construction time by
//! whoever embeds the library.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::arena::{DomTree, NodeId};

/// `white-space` rendering modes that change whether whitespace collapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhiteSpace {
    Normal,
    Pre,
    PreWrap,
    PreLine,
}

/// Layout knowledge the core needs: inline-vs-block rendering of elements
/// and the whitespace mode in effect for an element's character data.
pub trait StyleOracle {
    fn is_inline(&self, tree: &DomTree, element: NodeId) -> bool;

    fn white_space(&self, tree: &DomTree, element: NodeId) -> WhiteSpace;
}

/// Tag-table oracle with HTML-like defaults.
///
/// Suits hosts that render standard markup without author stylesheets;
/// anything fancier should implement [`StyleOracle`] against its real
/// layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagStyleOracle {
    inline_tags: BTreeSet<String>,
    white_space: BTreeMap<String, WhiteSpace>,
}

impl TagStyleOracle {
    pub fn new(
        inline_tags: impl IntoIterator<Item = String>,
        white_space: impl IntoIterator<Item = (String, WhiteSpace)>,
    ) -> Self {
        Self {
            inline_tags: inline_tags
                .into_iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            white_space: white_space
                .into_iter()
                .map(|(t, w)| (t.to_ascii_lowercase(), w))
                .collect(),
        }
    }

    /// Treat an additional tag as inline.
    pub fn with_inline_tag(mut self, tag: &str) -> Self {
        self.inline_tags.insert(tag.to_ascii_lowercase());
        self
    }

    /// Override the whitespace mode for a tag.
    pub fn with_white_space(mut self, tag: &str, mode: WhiteSpace) -> Self {
        self.white_space.insert(tag.to_ascii_lowercase(), mode);
        self
    }
}

impl Default for TagStyleOracle {
    fn default() -> Self {
        const INLINE: &[&str] = &[
            "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i",
            "img", "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strong", "sub",
            "sup", "time", "u", "var", "wbr",
        ];
        Self::new(
            INLINE.iter().map(|t| t.to_string()),
            [("pre".to_string(), WhiteSpace::Pre)],
        )
    }
}

impl StyleOracle for TagStyleOracle {
    fn is_inline(&self, tree: &DomTree, element: NodeId) -> bool {
        tree.tag(element)
            .map_or(false, |t| self.inline_tags.contains(t))
    }

    fn white_space(&self, tree: &DomTree, element: NodeId) -> WhiteSpace {
        tree.tag(element)
            .and_then(|t| self.white_space.get(t).copied())
            .unwrap_or(WhiteSpace::Normal)
    }
}
