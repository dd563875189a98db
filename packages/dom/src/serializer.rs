//! Serializer converts a subtree back to markup text.
//!
//! Used by tests and by the applied-state heuristic, which inspects the
//! rendered form of a span's content rather than re-deriving it from the
//! tree. Output is plain markup: attributes double-quoted in stored
//! order, text and attribute values escaped, void tags self-contained.

use std::fmt::Write;

use crate::arena::{DomTree, NodeId};

/// Tags serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Escape character data for markup text content.
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Markup for a node including the node itself.
pub fn outer_markup(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, node, &mut out);
    out
}

/// Markup for an element's children only.
pub fn inner_markup(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    for &child in tree.children(node) {
        write_node(tree, child, &mut out);
    }
    out
}

/// The opening tag of an element, attributes included.
pub fn start_tag(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    write_start_tag(tree, node, &mut out);
    out
}

/// The closing tag of an element; empty for void tags.
pub fn end_tag(tree: &DomTree, node: NodeId) -> String {
    match tree.tag(node) {
        Some(tag) if !is_void_tag(tag) => format!("</{tag}>"),
        _ => String::new(),
    }
}

fn write_node(tree: &DomTree, node: NodeId, out: &mut String) {
    if let Some(data) = tree.text(node) {
        out.push_str(&escape_text(data));
        return;
    }
    write_start_tag(tree, node, out);
    let tag = tree.tag(node).unwrap_or_default();
    if is_void_tag(tag) {
        return;
    }
    for &child in tree.children(node) {
        write_node(tree, child, out);
    }
    let _ = write!(out, "</{tag}>");
}

fn write_start_tag(tree: &DomTree, node: NodeId, out: &mut String) {
    let tag = tree.tag(node).unwrap_or_default();
    let _ = write!(out, "<{tag}");
    for (name, value) in tree.attributes(node) {
        let _ = write!(
            out,
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(value)
        );
    }
    out.push('>');
}
