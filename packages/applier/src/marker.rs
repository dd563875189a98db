//! Marker configuration.
//!
//! A [`Marker`] describes the wrapper an [`crate::Applier`] manages: the
//! container tag, the tag set it recognizes as its own, and the classes,
//! attributes, and style declarations it contributes, plus the flags
//! controlling whitespace, editability, element reuse, matching, and
//! post-edit normalization.

use applique_dom::{DomError, DomTree, NodeId};
use serde::{Deserialize, Serialize};

/// Immutable description of the marker to apply or remove.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Tag used when creating wrapper elements.
    pub tag: Option<String>,
    /// Tags recognized as this marker's own; empty means any element tag
    /// passes the tag check.
    pub tags: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub styles: Vec<(String, String)>,
    pub ignore_white_space: bool,
    pub apply_to_editable_only: bool,
    pub use_existing_elements: bool,
    pub ignore_classes: bool,
    pub ignore_attributes: bool,
    pub normalize: bool,
}

impl Default for Marker {
    fn default() -> Self {
        Self {
            tag: None,
            tags: Vec::new(),
            classes: Vec::new(),
            attributes: Vec::new(),
            styles: Vec::new(),
            ignore_white_space: true,
            apply_to_editable_only: false,
            use_existing_elements: true,
            ignore_classes: false,
            ignore_attributes: false,
            normalize: true,
        }
    }
}

impl Marker {
    /// Marker whose wrappers use `tag`, which is also its only
    /// recognized tag.
    pub fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        Self {
            tags: vec![tag.clone()],
            tag: Some(tag),
            ..Self::default()
        }
    }

    /// Marker matching any element tag; cannot create wrappers until a
    /// container tag is set.
    pub fn matching_any_tag() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        for t in tags {
            let t = t.to_ascii_lowercase();
            if !self.tags.contains(&t) {
                self.tags.push(t);
            }
        }
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.styles
            .push((property.to_ascii_lowercase(), value.to_string()));
        self
    }

    pub fn ignore_white_space(mut self, yes: bool) -> Self {
        self.ignore_white_space = yes;
        self
    }

    pub fn apply_to_editable_only(mut self, yes: bool) -> Self {
        self.apply_to_editable_only = yes;
        self
    }

    pub fn use_existing_elements(mut self, yes: bool) -> Self {
        self.use_existing_elements = yes;
        self
    }

    pub fn ignore_classes(mut self, yes: bool) -> Self {
        self.ignore_classes = yes;
        self
    }

    pub fn ignore_attributes(mut self, yes: bool) -> Self {
        self.ignore_attributes = yes;
        self
    }

    pub fn normalize(mut self, yes: bool) -> Self {
        self.normalize = yes;
        self
    }

    /// Does a tag pass the marker's tag check? An empty tag set passes
    /// everything.
    pub fn tag_matches(&self, tag: &str) -> bool {
        self.tags.is_empty() || self.tag_in_set(tag)
    }

    /// Is the tag literally one of the marker's own?
    pub fn tag_in_set(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// The marker's contributions as explicit settable facets.
    pub fn facets(&self) -> Vec<Facet> {
        let mut facets = Vec::new();
        if !self.classes.is_empty() {
            facets.push(Facet::Classes(self.classes.clone()));
        }
        if !self.attributes.is_empty() {
            facets.push(Facet::Attributes(self.attributes.clone()));
        }
        if !self.styles.is_empty() {
            facets.push(Facet::Styles(self.styles.clone()));
        }
        facets
    }
}

/// One settable aspect of an element the marker contributes: its class
/// set, its attribute map, or declarations in its `style` attribute.
/// Each knows how to apply itself and how to take itself back off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Facet {
    Classes(Vec<String>),
    Attributes(Vec<(String, String)>),
    Styles(Vec<(String, String)>),
}

impl Facet {
    pub fn apply(&self, tree: &mut DomTree, element: NodeId) -> Result<(), DomError> {
        match self {
            Facet::Classes(classes) => {
                for class in classes {
                    tree.add_class(element, class)?;
                }
            }
            Facet::Attributes(attrs) => {
                for (name, value) in attrs {
                    tree.set_attribute(element, name, value)?;
                }
            }
            Facet::Styles(decls) => {
                let mut current = parse_style(tree.attribute(element, "style").unwrap_or(""));
                for (prop, value) in decls {
                    if let Some(entry) = current.iter_mut().find(|(p, _)| p == prop) {
                        entry.1 = value.clone();
                    } else {
                        current.push((prop.clone(), value.clone()));
                    }
                }
                tree.set_attribute(element, "style", &write_style(&current))?;
            }
        }
        Ok(())
    }

    pub fn remove(&self, tree: &mut DomTree, element: NodeId) -> Result<(), DomError> {
        match self {
            Facet::Classes(classes) => {
                for class in classes {
                    tree.remove_class(element, class)?;
                }
            }
            Facet::Attributes(attrs) => {
                for (name, _) in attrs {
                    tree.remove_attribute(element, name)?;
                }
            }
            Facet::Styles(decls) => {
                let current = parse_style(tree.attribute(element, "style").unwrap_or(""));
                let remaining: Vec<_> = current
                    .into_iter()
                    .filter(|(p, _)| !decls.iter().any(|(dp, _)| dp == p))
                    .collect();
                if remaining.is_empty() {
                    tree.remove_attribute(element, "style")?;
                } else {
                    tree.set_attribute(element, "style", &write_style(&remaining))?;
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn parse_style(value: &str) -> Vec<(String, String)> {
    value
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim();
            let val = val.trim();
            (!prop.is_empty()).then(|| (prop.to_ascii_lowercase(), val.to_string()))
        })
        .collect()
}

fn write_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}
