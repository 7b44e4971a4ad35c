//! DOM Tree (arena-based allocation)

use std::collections::HashMap;

use crate::node::{ElementData, Node, NodeData};
use crate::shadow::{ShadowMode, ShadowRootData};
use crate::{DomError, NodeId};

/// Arena-based DOM tree.
///
/// Shadow roots are real nodes in the arena but are never linked into
/// the light tree: they are reachable only through the host map, so
/// traversal from the document root cannot cross a shadow boundary.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    shadow_hosts: HashMap<NodeId, NodeId>,
}

impl DomTree {
    /// Create a tree containing only the document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            shadow_hosts: HashMap::new(),
        }
    }

    /// Document root node.
    pub fn root(&self) -> NodeId {
        NodeId::from_index(0)
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Number of nodes in the arena (detached nodes included)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::new(NodeData::Element(ElementData::new(tag))))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::new(NodeData::Text(content.to_string())))
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.get(child).is_none_or(|n| n.parent.is_some()) {
            return Err(DomError::AlreadyAttached);
        }

        let prev = self.get(parent).map(|p| p.last_child).unwrap_or(NodeId::NONE);
        {
            let node = self.get_mut(child).ok_or(DomError::NotAnElement)?;
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = NodeId::NONE;
        }
        if prev.is_some() {
            if let Some(prev_node) = self.get_mut(prev) {
                prev_node.next_sibling = child;
            }
        }
        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
        Ok(())
    }

    /// Detach a subtree from its parent. The nodes stay in the arena
    /// but are no longer reachable from the document root.
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        }
        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        }
        if parent.is_some() {
            if let Some(p) = self.get_mut(parent) {
                if p.first_child == id {
                    p.first_child = next;
                }
                if p.last_child == id {
                    p.last_child = prev;
                }
            }
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Direct children of a node.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        while cur.is_some() {
            out.push(cur);
            cur = self.get(cur).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
        }
        out
    }

    /// Preorder descendants of `root`, excluding `root` itself.
    ///
    /// Shadow roots are not descendants of their host; they are only
    /// reachable via [`DomTree::shadow_root`].
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root);
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut kids = self.children(id);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Element data accessor
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| n.as_element())
    }

    /// Mutable element data accessor
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Attribute lookup on an element node
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Attribute update on an element node
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.set_attr(name, value);
        }
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, root: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(root).and_then(|n| n.as_text()) {
            out.push_str(text);
        }
        for id in self.descendants(root) {
            if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
                out.push_str(text);
            }
        }
        out
    }

    /// Attach a shadow root to a host element.
    ///
    /// One root per host: a repeat attach returns the existing root,
    /// mirroring how re-initialization finds the boundary already in
    /// place.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowMode) -> Result<NodeId, DomError> {
        if self.element(host).is_none() {
            return Err(DomError::NotAnElement);
        }
        if let Some(&existing) = self.shadow_hosts.get(&host) {
            return Ok(existing);
        }
        let root = self.push(Node::new(NodeData::ShadowRoot(ShadowRootData::new(host, mode))));
        self.shadow_hosts.insert(host, root);
        Ok(root)
    }

    /// Shadow root attached to `host`, if any.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_hosts.get(&host).copied()
    }

    /// Remove the shadow root of `host`, detaching its content.
    pub fn remove_shadow(&mut self, host: NodeId) {
        if let Some(root) = self.shadow_hosts.remove(&host) {
            for child in self.children(root) {
                self.detach(child);
            }
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_children() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let a = tree.create_element("span");
        let b = tree.create_text("hi");

        tree.append_child(tree.root(), div).unwrap();
        tree.append_child(div, a).unwrap();
        tree.append_child(div, b).unwrap();

        assert_eq!(tree.children(div), vec![a, b]);
        assert_eq!(tree.text_content(div), "hi");
    }

    #[test]
    fn test_append_attached_rejected() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(tree.root(), div).unwrap();
        assert!(tree.append_child(tree.root(), div).is_err());
    }

    #[test]
    fn test_detach_middle_child() {
        let mut tree = DomTree::new();
        let parent = tree.create_element("ul");
        tree.append_child(tree.root(), parent).unwrap();
        let items: Vec<_> = (0..3).map(|_| tree.create_element("li")).collect();
        for &li in &items {
            tree.append_child(parent, li).unwrap();
        }

        tree.detach(items[1]);
        assert_eq!(tree.children(parent), vec![items[0], items[2]]);
        assert!(tree.get(items[1]).unwrap().parent.is_none());
    }

    #[test]
    fn test_shadow_root_unreachable_from_light_tree() {
        let mut tree = DomTree::new();
        let host = tree.create_element("div");
        tree.append_child(tree.root(), host).unwrap();

        let root = tree.attach_shadow(host, ShadowMode::Open).unwrap();
        let inner = tree.create_element("p");
        tree.append_child(root, inner).unwrap();

        assert!(!tree.descendants(tree.root()).contains(&inner));
        assert_eq!(tree.shadow_root(host), Some(root));
    }

    #[test]
    fn test_attach_shadow_twice_returns_same_root() {
        let mut tree = DomTree::new();
        let host = tree.create_element("div");
        tree.append_child(tree.root(), host).unwrap();

        let a = tree.attach_shadow(host, ShadowMode::Open).unwrap();
        let b = tree.attach_shadow(host, ShadowMode::Open).unwrap();
        assert_eq!(a, b);
    }
}
