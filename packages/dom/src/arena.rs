//! Arena-backed document tree.
//!
//! Nodes live in a single `Vec` owned by [`DomTree`] and are addressed by
//! copyable [`NodeId`] handles. Ownership runs strictly parent → children;
//! the parent link is a non-owning back-reference used for traversal only.
//! Detaching a node never frees its slot, so a `NodeId` held by a caller
//! stays addressable even after the node leaves the tree.

use crate::error::DomError;

/// Stable handle to a node in a [`DomTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Element tags treated as atomic content units: childless embedded media
/// that a span either selects whole or not at all.
pub const ATOMIC_TAGS: &[&str] = &["img", "embed", "audio", "video"];

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeId>,
    },
    Text {
        data: String,
    },
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
}

/// A mutable element/text tree.
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree whose root is an element with the given tag.
    pub fn new(root_tag: &str) -> Self {
        let mut tree = DomTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.create_element(root_tag);
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element node. Tag names are stored lowercase.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.push(NodeData::Text {
            data: data.to_string(),
        })
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { data, parent: None });
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    // ------------------------------------------------------------------
    // Node kinds
    // ------------------------------------------------------------------

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Text { .. })
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text { .. } => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text { data } => Some(data),
            NodeData::Element { .. } => None,
        }
    }

    /// Length of a text leaf's character data in bytes; 0 for elements.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, str::len)
    }

    pub fn set_text(&mut self, id: NodeId, new_data: &str) -> Result<(), DomError> {
        match &mut self.node_mut(id).data {
            NodeData::Text { data } => {
                *data = new_data.to_string();
                Ok(())
            }
            NodeData::Element { .. } => Err(DomError::NotText),
        }
    }

    /// Childless embedded-media element (`img` and friends).
    pub fn is_atomic_leaf(&self, id: NodeId) -> bool {
        match &self.node(id).data {
            NodeData::Element { tag, children, .. } => {
                children.is_empty() && ATOMIC_TAGS.contains(&tag.as_str())
            }
            NodeData::Text { .. } => false,
        }
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).data {
            NodeData::Element { children, .. } => children,
            NodeData::Text { .. } => &[],
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Index of a node among its parent's children; 0 for a detached node.
    pub fn node_index(&self, id: NodeId) -> usize {
        match self.parent(id) {
            Some(p) => self
                .children(p)
                .iter()
                .position(|&c| c == id)
                .unwrap_or(0),
            None => 0,
        }
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let p = self.parent(id)?;
        let idx = self.node_index(id);
        if idx == 0 {
            None
        } else {
            self.child(p, idx - 1)
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let p = self.parent(id)?;
        self.child(p, self.node_index(id) + 1)
    }

    /// True if `ancestor` is a strict ancestor of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut cur = self.parent(descendant);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.parent(n);
        }
        false
    }

    /// Upward walk starting at the node itself.
    pub fn self_and_ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// Pre-order walk over the subtree below `id` (the node itself excluded).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Concatenated character data of all text leaves under `id`
    /// (including `id` itself if it is a text leaf).
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(data) = self.text(id) {
            return data.to_string();
        }
        let mut out = String::new();
        for n in self.descendants(id) {
            if let Some(data) = self.text(n) {
                out.push_str(data);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Insert `child` under `parent` before the child currently at `index`
    /// (`index == child_count` appends). The child is detached from its old
    /// parent first, exactly like a DOM `insertBefore`.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement);
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::CycleDetected);
        }
        let len = self.child_count(parent);
        if index > len {
            return Err(DomError::IndexOutOfBounds { index, len });
        }
        let reference = self.child(parent, index);
        self.detach(child);
        let at = match reference {
            // Inserting a node before itself leaves it where it was.
            Some(r) if r == child => index,
            Some(r) => self.node_index(r),
            None => self.child_count(parent),
        };
        match &mut self.node_mut(parent).data {
            NodeData::Element { children, .. } => children.insert(at, child),
            NodeData::Text { .. } => unreachable!("parent checked as element"),
        }
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let len = self.child_count(parent);
        self.insert_child(parent, len, child)
    }

    /// Remove a node from its parent's child list. The node (and its
    /// subtree) stays alive in the arena; no-op when already detached.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(p) = self.parent(id) {
            if let NodeData::Element { children, .. } = &mut self.node_mut(p).data {
                children.retain(|&c| c != id);
            }
            self.node_mut(id).parent = None;
        }
    }

    /// Shallow clone: same tag and attributes (or same character data),
    /// no children, detached.
    pub fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        match self.node(id).data.clone() {
            NodeData::Element { tag, attrs, .. } => self.push(NodeData::Element {
                tag,
                attrs,
                children: Vec::new(),
            }),
            NodeData::Text { data } => self.push(NodeData::Text { data }),
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text { .. } => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Ordered attribute list; empty for text leaves.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs,
            NodeData::Text { .. } => &[],
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        match &mut self.node_mut(id).data {
            NodeData::Element { attrs, .. } => {
                if let Some(entry) = attrs.iter_mut().find(|(n, _)| n == &name) {
                    entry.1 = value.to_string();
                } else {
                    attrs.push((name, value.to_string()));
                }
                Ok(())
            }
            NodeData::Text { .. } => Err(DomError::NotAnElement),
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        match &mut self.node_mut(id).data {
            NodeData::Element { attrs, .. } => {
                attrs.retain(|(n, _)| n != &name);
                Ok(())
            }
            NodeData::Text { .. } => Err(DomError::NotAnElement),
        }
    }

    // ------------------------------------------------------------------
    // Classes (the distinguished multi-valued attribute)
    // ------------------------------------------------------------------

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|v| v.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let value = match self.attribute(id, "class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attribute(id, "class", &value)
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        let remaining: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_owned)
            .collect();
        if remaining.is_empty() {
            self.remove_attribute(id, "class")
        } else {
            self.set_attribute(id, "class", &remaining.join(" "))
        }
    }

    /// Order-insensitive class-set comparison.
    pub fn same_classes(&self, a: NodeId, b: NodeId) -> bool {
        let mut ca = self.classes(a);
        let mut cb = self.classes(b);
        ca.sort_unstable();
        cb.sort_unstable();
        ca == cb
    }

    /// Equal attribute sets once `class` is set aside.
    pub fn same_non_class_attributes(&self, a: NodeId, b: NodeId) -> bool {
        let non_class = |id: NodeId| {
            self.attributes(id)
                .iter()
                .filter(|(n, _)| n != "class")
                .collect::<Vec<_>>()
        };
        let aa = non_class(a);
        let ba = non_class(b);
        aa.len() == ba.len()
            && aa
                .iter()
                .all(|(n, v)| ba.iter().any(|(bn, bv)| bn == n && bv == v))
    }

    /// Any attribute besides `class` and the given exceptions?
    pub fn has_non_class_attributes(&self, id: NodeId, exceptions: &[&str]) -> bool {
        self.attributes(id)
            .iter()
            .any(|(n, _)| n != "class" && !exceptions.contains(&n.as_str()))
    }

    // ------------------------------------------------------------------
    // Editable regions (`contenteditable` semantics)
    // ------------------------------------------------------------------

    /// Element with `contenteditable` in effect, inherited from the
    /// nearest ancestor that sets it.
    pub fn is_editable_element(&self, id: NodeId) -> bool {
        if !self.is_element(id) {
            return false;
        }
        match self.attribute(id, "contenteditable") {
            Some("false") => false,
            Some(_) => true,
            None => self
                .parent(id)
                .map_or(false, |p| self.is_editable_element(p)),
        }
    }

    /// The outermost element of an editable region.
    pub fn is_editing_host(&self, id: NodeId) -> bool {
        self.is_element(id)
            && self.is_editable_element(id)
            && !self
                .parent(id)
                .map_or(false, |p| self.is_editable_element(p))
    }

    /// Content that may be edited: inside an editable region, but not the
    /// region's host element itself.
    pub fn is_editable(&self, id: NodeId) -> bool {
        let in_editable = if self.is_element(id) {
            self.is_editable_element(id)
        } else {
            self.parent(id)
                .map_or(false, |p| self.is_editable_element(p))
        };
        in_editable && !self.is_editing_host(id)
    }
}

/// Pre-order iterator returned by [`DomTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        let children = self.tree.children(next);
        for &c in children.iter().rev() {
            self.stack.push(c);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new("div");
        let p = tree.create_element("p");
        let t = tree.create_text("hello");
        tree.append_child(tree.root(), p).unwrap();
        tree.append_child(p, t).unwrap();
        let root = tree.root();
        (tree, root, p, t)
    }

    #[test]
    fn test_build_and_navigate() {
        let (tree, root, p, t) = sample_tree();
        assert_eq!(tree.parent(p), Some(root));
        assert_eq!(tree.parent(t), Some(p));
        assert_eq!(tree.children(root), &[p]);
        assert_eq!(tree.first_child(p), Some(t));
        assert_eq!(tree.node_index(t), 0);
        assert_eq!(tree.tag(p), Some("p"));
        assert_eq!(tree.text(t), Some("hello"));
        assert_eq!(tree.text_len(t), 5);
    }

    #[test]
    fn test_tag_names_lowercased() {
        let mut tree = DomTree::new("DIV");
        assert_eq!(tree.tag(tree.root()), Some("div"));
        let el = tree.create_element("SPAN");
        assert_eq!(tree.tag(el), Some("span"));
    }

    #[test]
    fn test_insert_child_positions_and_siblings() {
        let (mut tree, _, p, t) = sample_tree();
        let t2 = tree.create_text("world");
        tree.insert_child(p, 0, t2).unwrap();
        assert_eq!(tree.children(p), &[t2, t]);
        assert_eq!(tree.next_sibling(t2), Some(t));
        assert_eq!(tree.prev_sibling(t), Some(t2));
        assert_eq!(tree.prev_sibling(t2), None);
        assert_eq!(tree.next_sibling(t), None);
    }

    #[test]
    fn test_insert_moves_from_old_parent() {
        let (mut tree, root, p, t) = sample_tree();
        let q = tree.create_element("p");
        tree.append_child(root, q).unwrap();
        tree.append_child(q, t).unwrap();
        assert_eq!(tree.child_count(p), 0);
        assert_eq!(tree.children(q), &[t]);
        assert_eq!(tree.parent(t), Some(q));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let (mut tree, root, p, _) = sample_tree();
        assert_eq!(
            tree.insert_child(p, 0, root),
            Err(DomError::CycleDetected)
        );
        assert_eq!(tree.insert_child(p, 0, p), Err(DomError::CycleDetected));
    }

    #[test]
    fn test_insert_index_out_of_bounds() {
        let (mut tree, _, p, _) = sample_tree();
        let t2 = tree.create_text("x");
        assert_eq!(
            tree.insert_child(p, 5, t2),
            Err(DomError::IndexOutOfBounds { index: 5, len: 1 })
        );
    }

    #[test]
    fn test_detach_keeps_node_alive() {
        let (mut tree, _, p, t) = sample_tree();
        tree.detach(t);
        assert_eq!(tree.parent(t), None);
        assert_eq!(tree.child_count(p), 0);
        assert_eq!(tree.text(t), Some("hello"));
        // Detaching again is a no-op.
        tree.detach(t);
        assert_eq!(tree.parent(t), None);
    }

    #[test]
    fn test_clone_shallow() {
        let (mut tree, _, p, _) = sample_tree();
        tree.set_attribute(p, "id", "original").unwrap();
        tree.add_class(p, "note").unwrap();
        let copy = tree.clone_shallow(p);
        assert_eq!(tree.tag(copy), Some("p"));
        assert_eq!(tree.attribute(copy, "id"), Some("original"));
        assert!(tree.has_class(copy, "note"));
        assert_eq!(tree.child_count(copy), 0);
        assert_eq!(tree.parent(copy), None);
    }

    #[test]
    fn test_ancestry() {
        let (tree, root, p, t) = sample_tree();
        assert!(tree.is_ancestor_of(root, t));
        assert!(tree.is_ancestor_of(p, t));
        assert!(!tree.is_ancestor_of(t, p));
        assert!(!tree.is_ancestor_of(p, p));
        let chain: Vec<_> = tree.self_and_ancestors(t).collect();
        assert_eq!(chain, vec![t, p, root]);
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, root, p, t) = sample_tree();
        let em = tree.create_element("em");
        let t2 = tree.create_text("!");
        tree.append_child(p, em).unwrap();
        tree.append_child(em, t2).unwrap();
        let order: Vec<_> = tree.descendants(root).collect();
        assert_eq!(order, vec![p, t, em, t2]);
    }

    #[test]
    fn test_text_content() {
        let (mut tree, root, p, _) = sample_tree();
        let em = tree.create_element("em");
        let t2 = tree.create_text(" world");
        tree.append_child(em, t2).unwrap();
        tree.append_child(p, em).unwrap();
        assert_eq!(tree.text_content(root), "hello world");
        assert_eq!(tree.text_content(t2), " world");
    }

    #[test]
    fn test_attributes_ordered_and_case_folded() {
        let (mut tree, _, p, t) = sample_tree();
        tree.set_attribute(p, "Data-Kind", "callout").unwrap();
        tree.set_attribute(p, "title", "note").unwrap();
        assert_eq!(tree.attribute(p, "data-kind"), Some("callout"));
        let names: Vec<_> = tree.attributes(p).iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["data-kind", "title"]);
        tree.set_attribute(p, "data-kind", "aside").unwrap();
        assert_eq!(tree.attribute(p, "data-kind"), Some("aside"));
        assert_eq!(tree.set_attribute(t, "x", "y"), Err(DomError::NotAnElement));
        tree.remove_attribute(p, "title").unwrap();
        assert!(!tree.has_attribute(p, "title"));
    }

    #[test]
    fn test_class_set_operations() {
        let (mut tree, _, p, _) = sample_tree();
        tree.add_class(p, "one").unwrap();
        tree.add_class(p, "two").unwrap();
        tree.add_class(p, "one").unwrap();
        assert_eq!(tree.attribute(p, "class"), Some("one two"));
        assert!(tree.has_class(p, "two"));
        tree.remove_class(p, "one").unwrap();
        assert_eq!(tree.attribute(p, "class"), Some("two"));
        tree.remove_class(p, "two").unwrap();
        assert!(!tree.has_attribute(p, "class"));
    }

    #[test]
    fn test_class_comparison_is_order_insensitive() {
        let mut tree = DomTree::new("div");
        let a = tree.create_element("span");
        let b = tree.create_element("span");
        tree.set_attribute(a, "class", "x y").unwrap();
        tree.set_attribute(b, "class", "y x").unwrap();
        assert!(tree.same_classes(a, b));
        tree.add_class(b, "z").unwrap();
        assert!(!tree.same_classes(a, b));
    }

    #[test]
    fn test_non_class_attribute_comparison() {
        let mut tree = DomTree::new("div");
        let a = tree.create_element("span");
        let b = tree.create_element("span");
        tree.set_attribute(a, "class", "x").unwrap();
        tree.set_attribute(a, "title", "t").unwrap();
        tree.set_attribute(b, "title", "t").unwrap();
        assert!(tree.same_non_class_attributes(a, b));
        tree.set_attribute(b, "title", "other").unwrap();
        assert!(!tree.same_non_class_attributes(a, b));
        assert!(tree.has_non_class_attributes(a, &[]));
        assert!(!tree.has_non_class_attributes(a, &["title"]));
    }

    #[test]
    fn test_atomic_leaves() {
        let mut tree = DomTree::new("div");
        let img = tree.create_element("img");
        let span = tree.create_element("span");
        let text = tree.create_text("x");
        assert!(tree.is_atomic_leaf(img));
        assert!(!tree.is_atomic_leaf(span));
        assert!(!tree.is_atomic_leaf(text));
    }

    #[test]
    fn test_editable_regions() {
        let mut tree = DomTree::new("div");
        let host = tree.create_element("section");
        tree.set_attribute(host, "contenteditable", "true").unwrap();
        let inner = tree.create_element("p");
        let text = tree.create_text("edit me");
        let frozen = tree.create_element("p");
        tree.set_attribute(frozen, "contenteditable", "false")
            .unwrap();
        let frozen_text = tree.create_text("read only");
        tree.append_child(tree.root(), host).unwrap();
        tree.append_child(host, inner).unwrap();
        tree.append_child(inner, text).unwrap();
        tree.append_child(host, frozen).unwrap();
        tree.append_child(frozen, frozen_text).unwrap();

        assert!(tree.is_editing_host(host));
        // The host itself is not editable content, its descendants are.
        assert!(!tree.is_editable(host));
        assert!(tree.is_editable(inner));
        assert!(tree.is_editable(text));
        // contenteditable=false cuts the region off.
        assert!(!tree.is_editable(frozen));
        assert!(!tree.is_editable(frozen_text));
        // Outside any region nothing is editable.
        assert!(!tree.is_editable(tree.root()));
    }
}
