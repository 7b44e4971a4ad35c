//! Widget UI construction
//!
//! Builds the control surface through the instance's `DomContext` with
//! prefix-derived class names. Nothing in here touches the host
//! document directly.

use alcove_dom::{DomContext, DomError, DomTree, NodeId};
use alcove_net::ScraperStats;
use serde_json::Value;

use crate::config::Theme;

/// The widget stylesheet, parameterized on the configured class
/// prefix. Scoping (or a shadow root) is applied by the caller.
pub fn widget_css(prefix: &str) -> String {
    format!(
        r#":root {{ --{p}accent: #0a7; }}
.{p}widget {{ font-family: system-ui, sans-serif; border: 1px solid #d5d5d5; border-radius: 6px; padding: 12px; }}
.{p}compact {{ padding: 6px; font-size: 13px; }}
.{p}header {{ display: flex; justify-content: space-between; margin-bottom: 8px; }}
.{p}title {{ font-weight: 600; }}
.{p}status {{ color: #666; }}
.{p}status-healthy {{ color: var(--{p}accent); }}
.{p}status-error {{ color: #c22; }}
.{p}controls {{ display: flex; gap: 6px; margin-bottom: 8px; }}
.{p}btn {{ cursor: pointer; border: 1px solid #bbb; border-radius: 4px; padding: 4px 10px; }}
.{p}btn:hover {{ background: #f0f0f0; }}
.{p}search {{ flex: 1; padding: 4px 6px; }}
.{p}stats {{ color: #444; font-size: 12px; margin-bottom: 8px; }}
.{p}results {{ list-style: none; margin: 0; padding: 0; }}
.{p}results li {{ padding: 4px 0; border-bottom: 1px solid #eee; }}
.{p}pager {{ margin-top: 8px; font-size: 12px; color: #666; }}
@media (max-width: 480px) {{
    .{p}controls {{ flex-wrap: wrap; }}
}}
"#,
        p = prefix
    )
}

/// Handles to the interesting elements of one instance's markup.
#[derive(Debug, Clone, Copy)]
pub struct UiRefs {
    pub widget: NodeId,
    pub status_badge: NodeId,
    pub stats_bar: NodeId,
    pub results_list: NodeId,
    pub pager_label: NodeId,
}

/// Build the widget markup under a boundary root.
///
/// A couple of the controls deliberately carry legacy inline-handler
/// attributes so template-driven markup keeps working; the bridge
/// rebinds them right after this runs.
pub fn build_markup(
    tree: &mut DomTree,
    root: NodeId,
    prefix: &str,
    theme: Theme,
    instance_id: &str,
) -> Result<UiRefs, DomError> {
    let widget = tree.create_element("div");
    {
        let elem = tree.element_mut(widget).ok_or(DomError::NotAnElement)?;
        elem.add_class(&format!("{}widget", prefix));
        if theme == Theme::Compact {
            elem.add_class(&format!("{}compact", prefix));
        }
        elem.set_attr("data-instance", instance_id);
    }
    tree.append_child(root, widget)?;

    // Header: title + status badge.
    let header = child_div(tree, widget, &format!("{}header", prefix))?;
    let title = child_elem(tree, header, "span", &format!("{}title", prefix))?;
    set_text(tree, title, "Scraper Control");
    let status_badge = child_elem(tree, header, "span", &format!("{}status", prefix))?;
    set_text(tree, status_badge, "status: unknown");

    // Controls row. The scrape buttons use the legacy inline form.
    let controls = child_div(tree, widget, &format!("{}controls", prefix))?;
    let scrape = child_elem(tree, controls, "button", &format!("{}btn", prefix))?;
    set_text(tree, scrape, "Start scrape");
    tree.set_attr(scrape, "onclick", "ScraperWidget.triggerScraping()");
    let quick = child_elem(tree, controls, "button", &format!("{}btn", prefix))?;
    set_text(tree, quick, "Quick scrape");
    tree.set_attr(quick, "onclick", "ScraperWidget.triggerQuickScraping()");
    let pause = child_elem(tree, controls, "button", &format!("{}btn", prefix))?;
    set_text(tree, pause, "Pause");
    tree.set_attr(pause, "onclick", "ScraperWidget.pauseJob()");
    let search = child_elem(tree, controls, "input", &format!("{}search", prefix))?;
    tree.set_attr(search, "type", "search");
    tree.set_attr(search, "placeholder", "Search results");

    let stats_bar = child_div(tree, widget, &format!("{}stats", prefix))?;
    let results_list = child_elem(tree, widget, "ul", &format!("{}results", prefix))?;
    let pager = child_div(tree, widget, &format!("{}pager", prefix))?;
    let pager_label = child_elem(tree, pager, "span", &format!("{}page-label", prefix))?;
    set_text(tree, pager_label, "Page 1");

    Ok(UiRefs {
        widget,
        status_badge,
        stats_bar,
        results_list,
        pager_label,
    })
}

fn child_div(tree: &mut DomTree, parent: NodeId, class: &str) -> Result<NodeId, DomError> {
    child_elem(tree, parent, "div", class)
}

fn child_elem(
    tree: &mut DomTree,
    parent: NodeId,
    tag: &str,
    class: &str,
) -> Result<NodeId, DomError> {
    let node = tree.create_element(tag);
    if let Some(elem) = tree.element_mut(node) {
        elem.add_class(class);
    }
    tree.append_child(parent, node)?;
    Ok(node)
}

/// Replace a node's children with a single text node.
pub fn set_text(tree: &mut DomTree, node: NodeId, text: &str) {
    for child in tree.children(node) {
        tree.detach(child);
    }
    let content = tree.create_text(text);
    if tree.append_child(node, content).is_err() {
        tracing::warn!("text could not be set");
    }
}

/// Render the status badge from the status endpoint payload.
pub fn render_status(tree: &mut DomTree, badge: NodeId, prefix: &str, payload: &Value) {
    let available = payload
        .get("scraping_available")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let running = payload
        .get("current_job")
        .map(|j| !j.is_null())
        .unwrap_or(false);

    let label = if running {
        "status: scraping"
    } else if available {
        "status: idle"
    } else {
        "status: unavailable"
    };
    set_text(tree, badge, label);

    if let Some(elem) = tree.element_mut(badge) {
        let healthy = format!("{}status-healthy", prefix);
        let error = format!("{}status-error", prefix);
        elem.remove_attr("class");
        elem.add_class(&format!("{}status", prefix));
        elem.add_class(if available { &healthy } else { &error });
    }
}

/// Render the stats strip.
pub fn render_stats(tree: &mut DomTree, bar: NodeId, stats: &ScraperStats) {
    let line = format!(
        "{} results · {} categories · {}/{} jobs successful",
        stats.total_results, stats.total_categories, stats.successful_jobs, stats.total_jobs
    );
    set_text(tree, bar, &line);
}

/// Render one page of results into the list.
pub fn render_results(
    tree: &mut DomTree,
    list: NodeId,
    pager_label: NodeId,
    items: &[Value],
    page: u32,
) {
    for child in tree.children(list) {
        tree.detach(child);
    }
    for item in items {
        let li = tree.create_element("li");
        let title = item
            .get("title")
            .and_then(|v| v.as_str())
            .or_else(|| item.get("url").and_then(|v| v.as_str()))
            .unwrap_or("(untitled)");
        set_text(tree, li, title);
        if tree.append_child(list, li).is_err() {
            tracing::warn!("result row could not be appended");
        }
    }
    set_text(tree, pager_label, &format!("Page {}", page));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markup_class_prefixing() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        tree.append_child(tree.root(), root).unwrap();

        let refs = build_markup(&mut tree, root, "c4ai-", Theme::Default, "w1").unwrap();
        let widget = tree.element(refs.widget).unwrap();
        assert!(widget.has_class("c4ai-widget"));
        assert!(!widget.has_class("c4ai-compact"));
        assert_eq!(widget.attr("data-instance"), Some("w1"));
    }

    #[test]
    fn test_compact_theme_class() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        tree.append_child(tree.root(), root).unwrap();

        let refs = build_markup(&mut tree, root, "x-", Theme::Compact, "w1").unwrap();
        assert!(tree.element(refs.widget).unwrap().has_class("x-compact"));
    }

    #[test]
    fn test_render_results_replaces_rows() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        tree.append_child(tree.root(), root).unwrap();
        let refs = build_markup(&mut tree, root, "c4ai-", Theme::Default, "w1").unwrap();

        render_results(
            &mut tree,
            refs.results_list,
            refs.pager_label,
            &[json!({"title": "A"}), json!({"title": "B"})],
            1,
        );
        assert_eq!(tree.children(refs.results_list).len(), 2);

        render_results(
            &mut tree,
            refs.results_list,
            refs.pager_label,
            &[json!({"url": "http://c"})],
            2,
        );
        assert_eq!(tree.children(refs.results_list).len(), 1);
        assert_eq!(tree.text_content(refs.pager_label), "Page 2");
    }

    #[test]
    fn test_render_status_states() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        tree.append_child(tree.root(), root).unwrap();
        let refs = build_markup(&mut tree, root, "c4ai-", Theme::Default, "w1").unwrap();

        render_status(
            &mut tree,
            refs.status_badge,
            "c4ai-",
            &json!({"scraping_available": true, "current_job": null}),
        );
        assert_eq!(tree.text_content(refs.status_badge), "status: idle");
        assert!(tree
            .element(refs.status_badge)
            .unwrap()
            .has_class("c4ai-status-healthy"));

        render_status(
            &mut tree,
            refs.status_badge,
            "c4ai-",
            &json!({"scraping_available": true, "current_job": {"job_id": "j1"}}),
        );
        assert_eq!(tree.text_content(refs.status_badge), "status: scraping");
    }

    #[test]
    fn test_widget_css_uses_prefix() {
        let css = widget_css("c4ai-");
        assert!(css.contains(".c4ai-widget"));
        assert!(css.contains(".c4ai-results li"));
        assert!(!css.contains(".{p}"));
    }
}
