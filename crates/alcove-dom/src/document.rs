//! Host document - High-level document API

use crate::query::{query_within, SimpleSelector};
use crate::{DomError, DomTree, NodeId};

/// Where an embed call points the widget.
#[derive(Debug, Clone)]
pub enum ContainerTarget {
    /// Simple selector resolved against the host document
    Selector(String),
    /// Already-resolved host node
    Node(NodeId),
}

impl From<&str> for ContainerTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<NodeId> for ContainerTarget {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

/// The uncontrolled host page the widget embeds into.
pub struct HostDocument {
    pub tree: DomTree,
    head: NodeId,
    body: NodeId,
    shadow_supported: bool,
}

impl HostDocument {
    /// Create a document with the html/head/body skeleton.
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        let root = tree.root();
        tree.append_child(root, html).expect("fresh node");
        tree.append_child(html, head).expect("fresh node");
        tree.append_child(html, body).expect("fresh node");

        Self {
            tree,
            head,
            body,
            shadow_supported: true,
        }
    }

    /// Get `<head>` element
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// Get `<body>` element
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether the platform supports attaching shadow roots. Always
    /// true for this model; tests flip it to exercise the fallback.
    pub fn shadow_supported(&self) -> bool {
        self.shadow_supported
    }

    pub fn set_shadow_supported(&mut self, supported: bool) {
        self.shadow_supported = supported;
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        let sel = SimpleSelector::Id(id.to_string());
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&node| sel.matches(&self.tree, node))
    }

    /// First match for a simple selector anywhere in the document.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        query_within(&self.tree, self.tree.root(), selector)
    }

    /// Resolve an embed target to a concrete element node.
    ///
    /// Fails fast without mutating anything when the target does not
    /// resolve; the caller turns this into its container-not-found
    /// error surface.
    pub fn resolve_container(&self, target: &ContainerTarget) -> Result<NodeId, DomError> {
        match target {
            ContainerTarget::Selector(sel) => self
                .query(sel)
                .ok_or_else(|| DomError::ContainerNotFound(sel.clone())),
            ContainerTarget::Node(id) => {
                if self.tree.element(*id).is_some() {
                    Ok(*id)
                } else {
                    Err(DomError::ContainerNotFound(format!("{:?}", id)))
                }
            }
        }
    }

    /// Create an element appended under `<body>` (host-page fixture
    /// helper).
    pub fn create_container(&mut self, tag: &str, id: &str) -> NodeId {
        let node = self.tree.create_element(tag);
        self.tree.set_attr(node, "id", id);
        self.tree
            .append_child(self.body, node)
            .expect("fresh node");
        node
    }
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = HostDocument::new();
        assert!(doc.tree.element(doc.head()).is_some_and(|e| e.tag == "head"));
        assert!(doc.tree.element(doc.body()).is_some_and(|e| e.tag == "body"));
    }

    #[test]
    fn test_resolve_container_by_selector() {
        let mut doc = HostDocument::new();
        let node = doc.create_container("div", "widget-a");
        assert_eq!(doc.resolve_container(&"#widget-a".into()).unwrap(), node);
    }

    #[test]
    fn test_resolve_container_missing() {
        let doc = HostDocument::new();
        let err = doc.resolve_container(&"#missing".into()).unwrap_err();
        assert!(matches!(err, DomError::ContainerNotFound(_)));
    }
}
