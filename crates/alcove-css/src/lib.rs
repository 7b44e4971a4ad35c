//! Alcove CSS Scoping Engine
//!
//! Rewrites widget stylesheets so every selector only matches elements
//! belonging to one widget instance.

mod ledger;
mod rules;
mod scope;

pub use ledger::InjectionLedger;
pub use rules::{split_rules, Segment};
pub use scope::{scope_stylesheet, scope_stylesheet_checked, specificity, ScopeEngine, Specificity};

/// Attribute used to mark a widget instance's DOM subtree.
pub const SCOPE_ATTR: &str = "data-instance";

/// Build the attribute selector that anchors a scoped rule.
pub fn scope_selector(instance_id: &str) -> String {
    format!("[{}=\"{}\"]", SCOPE_ATTR, instance_id)
}

/// CSS scoping error
#[derive(Debug, thiserror::Error)]
pub enum CssError {
    #[error("malformed rule at offset {offset}: {message}")]
    MalformedRule { offset: usize, message: String },
}
