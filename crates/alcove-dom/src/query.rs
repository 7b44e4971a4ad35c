//! Element queries
//!
//! Simple selector parsing and subtree-scoped matching.

use crate::{DomTree, NodeId};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Tag(String),
    Class(String),
    Id(String),
    Universal,
    /// `[attr="value"]` attribute-equality selector
    Attr { name: String, value: String },
}

impl SimpleSelector {
    /// Parse a simple selector string.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if s == "*" {
            Some(Self::Universal)
        } else if let Some(id) = s.strip_prefix('#') {
            Some(Self::Id(id.to_string()))
        } else if let Some(class) = s.strip_prefix('.') {
            Some(Self::Class(class.to_string()))
        } else if let Some(body) = s.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            let (name, value) = body.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some(Self::Attr {
                name: name.trim().to_string(),
                value: value.to_string(),
            })
        } else {
            Some(Self::Tag(s.to_lowercase()))
        }
    }

    /// Check whether an element node matches.
    pub fn matches(&self, tree: &DomTree, id: NodeId) -> bool {
        let Some(elem) = tree.element(id) else {
            return false;
        };
        match self {
            Self::Universal => true,
            Self::Tag(tag) => elem.tag.eq_ignore_ascii_case(tag),
            Self::Id(want) => elem.id() == Some(want),
            Self::Class(class) => elem.has_class(class),
            Self::Attr { name, value } => elem.attr(name) == Some(value),
        }
    }
}

/// First descendant of `root` matching `selector`.
pub fn query_within(tree: &DomTree, root: NodeId, selector: &str) -> Option<NodeId> {
    let sel = SimpleSelector::parse(selector)?;
    tree.descendants(root)
        .into_iter()
        .find(|&id| sel.matches(tree, id))
}

/// All descendants of `root` matching `selector`, in document order.
pub fn query_all_within(tree: &DomTree, root: NodeId, selector: &str) -> Vec<NodeId> {
    let Some(sel) = SimpleSelector::parse(selector) else {
        return Vec::new();
    };
    tree.descendants(root)
        .into_iter()
        .filter(|&id| sel.matches(tree, id))
        .collect()
}
