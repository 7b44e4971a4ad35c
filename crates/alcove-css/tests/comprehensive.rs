//! Comprehensive tests for alcove-css
//!
//! Exercises the scoping transform against the properties the widget
//! engine depends on: one marker per selector, untouched declaration
//! blocks, idempotence, and cross-instance disjointness.

use alcove_css::{scope_selector, scope_stylesheet, InjectionLedger, ScopeEngine};

const WIDGET_CSS: &str = r#"
.c4ai-widget { font-family: sans-serif; border: 1px solid #ddd; }
.c4ai-header, .c4ai-footer { padding: 8px; }
.c4ai-btn:hover { background: #eee; }
.c4ai-btn::after { content: ""; }
:root { --c4ai-accent: #0a7; }
@media (max-width: 480px) {
    .c4ai-widget { font-size: 12px; }
}
.c4ai-results li { list-style: none; }
"#;

#[test]
fn test_one_marker_per_selector() {
    let scoped = scope_stylesheet(WIDGET_CSS, "w42");
    let marker = scope_selector("w42");

    // Selector count outside at-rules: widget(1) + header/footer(2) +
    // hover(1) + after(1) + root(1) + results(1) = 7.
    assert_eq!(scoped.matches(&marker).count(), 7);
}

#[test]
fn test_declarations_unchanged() {
    let scoped = scope_stylesheet(WIDGET_CSS, "w42");
    assert!(scoped.contains("{ font-family: sans-serif; border: 1px solid #ddd; }"));
    assert!(scoped.contains("{ padding: 8px; }"));
    assert!(scoped.contains("{ --c4ai-accent: #0a7; }"));
}

#[test]
fn test_media_block_untouched() {
    let scoped = scope_stylesheet(WIDGET_CSS, "w42");
    assert!(scoped.contains(
        "@media (max-width: 480px) {\n    .c4ai-widget { font-size: 12px; }\n}"
    ));
}

#[test]
fn test_idempotent_under_reapplication() {
    let once = scope_stylesheet(WIDGET_CSS, "w42");
    let twice = scope_stylesheet(&once, "w42");
    assert_eq!(once, twice);
}

#[test]
fn test_instances_are_disjoint() {
    let a = scope_stylesheet(WIDGET_CSS, "a-1");
    let b = scope_stylesheet(WIDGET_CSS, "b-1");

    // No selector generated for A references B's scope, and vice versa.
    assert!(!a.contains(&scope_selector("b-1")));
    assert!(!b.contains(&scope_selector("a-1")));
    assert_ne!(a, b);
}

#[test]
fn test_empty_stylesheet() {
    assert_eq!(scope_stylesheet("", "w1"), "");
}

#[test]
fn test_engine_and_ledger_roundtrip() {
    let engine = ScopeEngine::new();
    let ledger = InjectionLedger::new();

    let scoped = engine.scope(WIDGET_CSS, "w1");
    assert!(ledger.first_injection(&scoped, "w1"));

    // Re-initialization: same content, same id, no second injection.
    let again = engine.scope(WIDGET_CSS, "w1");
    assert!(!ledger.first_injection(&again, "w1"));
}
