//! Shared style registry
//!
//! One `<style>` tag per css prefix, shared by every instance using
//! that prefix and reference-counted so the tag is only removed when
//! the last user is destroyed.

use std::collections::HashMap;

use crate::{HostDocument, NodeId};

/// Attribute identifying a registry-owned style tag.
pub const STYLE_TAG_ATTR: &str = "data-alcove-style";

#[derive(Debug)]
struct StyleEntry {
    tag: NodeId,
    refs: usize,
}

/// Reference-counted shared `<style>` tags keyed by css prefix.
#[derive(Debug, Default)]
pub struct StyleRegistry {
    entries: HashMap<String, StyleEntry>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference on the shared tag for `prefix`, injecting the
    /// tag into `<head>` on first use.
    pub fn acquire(&mut self, doc: &mut HostDocument, prefix: &str) -> NodeId {
        if let Some(entry) = self.entries.get_mut(prefix) {
            entry.refs += 1;
            return entry.tag;
        }

        let tag = doc.tree.create_element("style");
        doc.tree.set_attr(tag, STYLE_TAG_ATTR, prefix);
        let head = doc.head();
        doc.tree.append_child(head, tag).expect("fresh node");
        tracing::debug!(prefix, "injected shared style tag");

        self.entries
            .insert(prefix.to_string(), StyleEntry { tag, refs: 1 });
        tag
    }

    /// Append one instance's scoped CSS to the shared tag.
    pub fn append_section(&self, doc: &mut HostDocument, tag: NodeId, css: &str) {
        let text = doc.tree.create_text(css);
        if doc.tree.append_child(tag, text).is_err() {
            tracing::warn!("style section could not be appended");
        }
    }

    /// Drop a reference; the tag is removed from the document when the
    /// last instance using the prefix releases it.
    pub fn release(&mut self, doc: &mut HostDocument, prefix: &str) {
        let Some(entry) = self.entries.get_mut(prefix) else {
            return;
        };
        entry.refs -= 1;
        if entry.refs == 0 {
            let tag = entry.tag;
            self.entries.remove(prefix);
            doc.tree.detach(tag);
            tracing::debug!(prefix, "removed shared style tag");
        }
    }

    /// Current tag for a prefix, if any instance holds it.
    pub fn tag_for(&self, prefix: &str) -> Option<NodeId> {
        self.entries.get(prefix).map(|e| e.tag)
    }

    /// Live reference count for a prefix.
    pub fn ref_count(&self, prefix: &str) -> usize {
        self.entries.get(prefix).map(|e| e.refs).unwrap_or(0)
    }
}
