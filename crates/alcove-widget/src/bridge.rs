//! Inline-handler bridge
//!
//! Legacy widget templates carry inline `on*` attributes that call a
//! shared global object. The bridge rewrites those references to
//! id-scoped registry calls so each copy of the markup drives its own
//! instance.

use alcove_dom::{DomContext, DomTree};

/// Global object name legacy templates reference.
pub const LEGACY_GLOBAL: &str = "ScraperWidget.";

/// Registry accessor the rewrite points at.
pub const REGISTRY_GLOBAL: &str = "AlcoveRegistry";

/// Marker attribute set on rewritten elements.
///
/// Idempotence hangs on this marker, not on re-matching the original
/// pattern: a rewritten attribute no longer contains the legacy name,
/// but an element that never referenced it must also not be rescanned
/// into a double prefix by a later pass.
pub const BOUND_MARKER: &str = "data-alcove-bound";

/// Rewrite every legacy inline-handler reference inside a boundary.
///
/// Returns the number of elements rewritten. Reapplying to the same
/// subtree is a no-op.
pub fn rewrite_inline_handlers(
    tree: &mut DomTree,
    context: &DomContext,
    instance_id: &str,
) -> usize {
    let replacement = format!("{}.get('{}').", REGISTRY_GLOBAL, instance_id);
    let mut rewritten = 0;

    for node in tree.descendants(context.root()) {
        let Some(elem) = tree.element(node) else {
            continue;
        };
        if elem.has_attr(BOUND_MARKER) {
            continue;
        }

        let updates: Vec<(String, String)> = elem
            .attrs()
            .filter(|(name, value)| name.starts_with("on") && value.contains(LEGACY_GLOBAL))
            .map(|(name, value)| (name.to_string(), value.replace(LEGACY_GLOBAL, &replacement)))
            .collect();

        if updates.is_empty() {
            continue;
        }
        for (name, value) in updates {
            tree.set_attr(node, &name, &value);
        }
        tree.set_attr(node, BOUND_MARKER, instance_id);
        rewritten += 1;
    }

    if rewritten > 0 {
        tracing::debug!(instance = instance_id, count = rewritten, "inline handlers rebound");
    }
    rewritten
}
