//! DOM isolation strategies
//!
//! Erects the boundary that keeps one widget instance's styles and
//! queries from leaking into the host page or a sibling instance.

use crate::query::{query_all_within, query_within};
use crate::styles::StyleRegistry;
use crate::{DomError, DomTree, HostDocument, NodeId, ShadowMode};

/// The root used for all of an instance's element lookups.
///
/// Widget code queries through this context, never through the host
/// document, which is what makes the scoped-class strategy hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomContext {
    /// Shadow root attached to the container
    Shadow(NodeId),
    /// Wrapper element tagged with `data-instance`
    Scoped(NodeId),
}

impl DomContext {
    /// The context's root node.
    pub fn root(&self) -> NodeId {
        match self {
            Self::Shadow(id) | Self::Scoped(id) => *id,
        }
    }

    /// First matching element inside the boundary.
    pub fn query(&self, tree: &DomTree, selector: &str) -> Option<NodeId> {
        query_within(tree, self.root(), selector)
    }

    /// All matching elements inside the boundary.
    pub fn query_all(&self, tree: &DomTree, selector: &str) -> Vec<NodeId> {
        query_all_within(tree, self.root(), selector)
    }

    pub fn is_shadow(&self) -> bool {
        matches!(self, Self::Shadow(_))
    }
}

/// Inputs for erecting an isolation boundary.
///
/// The CSS arrives pre-split by the caller: the raw sheet goes inside
/// shadow roots untouched, the scoped variant goes into the shared
/// head tag. `scoped_css` is `None` when the injection ledger says the
/// pair was already injected.
#[derive(Debug)]
pub struct IsolationRequest<'a> {
    pub container: NodeId,
    pub instance_id: &'a str,
    pub use_shadow: bool,
    pub raw_css: &'a str,
    pub scoped_css: Option<&'a str>,
    pub css_prefix: &'a str,
}

/// Erect the isolation boundary for one instance and return its
/// [`DomContext`].
///
/// Shadow strategy when requested and supported; scoped-class wrapper
/// otherwise. The container itself is never restyled or reparented.
pub fn erect_boundary(
    doc: &mut HostDocument,
    styles: &mut StyleRegistry,
    req: IsolationRequest<'_>,
) -> Result<DomContext, DomError> {
    if doc.tree.element(req.container).is_none() {
        return Err(DomError::NotAnElement);
    }

    if req.use_shadow && doc.shadow_supported() {
        let root = doc.tree.attach_shadow(req.container, ShadowMode::Open)?;

        // Shadow DOM already isolates; the sheet goes in unscoped.
        let style = doc.tree.create_element("style");
        let text = doc.tree.create_text(req.raw_css);
        doc.tree.append_child(style, text)?;
        doc.tree.append_child(root, style)?;

        tracing::debug!(instance = req.instance_id, "shadow boundary erected");
        return Ok(DomContext::Shadow(root));
    }

    if req.use_shadow {
        tracing::warn!(
            instance = req.instance_id,
            "shadow roots unsupported, falling back to scoped-class strategy"
        );
    }

    let tag = styles.acquire(doc, req.css_prefix);
    if let Some(css) = req.scoped_css {
        styles.append_section(doc, tag, css);
    }

    let wrapper = doc.tree.create_element("div");
    doc.tree
        .set_attr(wrapper, alcove_css_scope_attr(), req.instance_id);
    doc.tree.append_child(req.container, wrapper)?;

    tracing::debug!(instance = req.instance_id, "scoped boundary erected");
    Ok(DomContext::Scoped(wrapper))
}

/// The scoping attribute name shared with the CSS engine.
///
/// Kept as a local constant so this crate does not depend on
/// alcove-css; the value is part of the wire format between the two.
fn alcove_css_scope_attr() -> &'static str {
    "data-instance"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(container: NodeId, id: &'a str, shadow: bool) -> IsolationRequest<'a> {
        IsolationRequest {
            container,
            instance_id: id,
            use_shadow: shadow,
            raw_css: ".btn { color: red; }",
            scoped_css: Some("[data-instance=\"w1\"] .btn { color: red; }"),
            css_prefix: "c4ai-",
        }
    }

    #[test]
    fn test_shadow_boundary() {
        let mut doc = HostDocument::new();
        let mut styles = StyleRegistry::new();
        let container = doc.create_container("div", "host");

        let ctx = erect_boundary(&mut doc, &mut styles, request(container, "w1", true)).unwrap();
        assert!(ctx.is_shadow());

        // Style lives inside the root, not in head.
        assert!(ctx.query(&doc.tree, "style").is_some());
        assert!(doc.tree.children(doc.head()).is_empty());
    }

    #[test]
    fn test_scoped_boundary() {
        let mut doc = HostDocument::new();
        let mut styles = StyleRegistry::new();
        let container = doc.create_container("div", "host");

        let ctx = erect_boundary(&mut doc, &mut styles, request(container, "w1", false)).unwrap();
        assert!(!ctx.is_shadow());

        let wrapper = ctx.root();
        assert_eq!(doc.tree.attr(wrapper, "data-instance"), Some("w1"));
        // Shared tag landed in head with the scoped section.
        let tag = styles.tag_for("c4ai-").unwrap();
        assert!(doc.tree.text_content(tag).contains("[data-instance=\"w1\"]"));
    }

    #[test]
    fn test_shadow_fallback_when_unsupported() {
        let mut doc = HostDocument::new();
        let mut styles = StyleRegistry::new();
        doc.set_shadow_supported(false);
        let container = doc.create_container("div", "host");

        let ctx = erect_boundary(&mut doc, &mut styles, request(container, "w1", true)).unwrap();
        assert!(!ctx.is_shadow());
    }

    #[test]
    fn test_two_shadow_instances_distinct_roots() {
        let mut doc = HostDocument::new();
        let mut styles = StyleRegistry::new();
        let a = doc.create_container("div", "a");
        let b = doc.create_container("div", "b");

        let ctx_a = erect_boundary(&mut doc, &mut styles, request(a, "w1", true)).unwrap();
        let ctx_b = erect_boundary(&mut doc, &mut styles, request(b, "w2", true)).unwrap();
        assert_ne!(ctx_a.root(), ctx_b.root());
    }
}
