//! Integration tests for alcove-widget
//!
//! Exercises the embedding facade end to end against an in-memory
//! host document: lifecycle, isolation, registry, events, and the
//! gateway client against a canned local server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use alcove_widget::{
    ConfigPatch, EventKind, Theme, WidgetConfig, WidgetEvent, WidgetHandle, WidgetManager,
};

/// Collect events of one kind into a shared vec.
fn capture(handle: &WidgetHandle, kind: EventKind) -> Arc<Mutex<Vec<WidgetEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    handle.add_event_listener(kind, move |e| {
        sink.lock().unwrap().push(e.clone());
    });
    seen
}

fn scoped_config() -> WidgetConfig {
    WidgetConfig {
        auto_init: false,
        ..WidgetConfig::default()
    }
}

#[tokio::test]
async fn test_initialize_emits_and_registers() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.create(WidgetConfig {
        container: Some("#host".into()),
        ..scoped_config()
    });
    let initialized = capture(&handle, EventKind::Initialized);
    assert!(!handle.is_initialized());

    handle.initialize().await.unwrap();
    assert!(handle.is_initialized());
    assert_eq!(initialized.lock().unwrap().len(), 1);

    let ctx = handle.dom_context().unwrap();
    assert!(!ctx.is_shadow());
    assert!(manager.registry().contains(handle.instance_id()));
}

#[tokio::test]
async fn test_missing_container_emits_error_and_touches_nothing() {
    let manager = WidgetManager::new();
    let before = manager.with_doc(|doc| doc.tree.len());

    let handle = manager.create(WidgetConfig {
        container: Some("#missing".into()),
        auto_init: false,
        ..WidgetConfig::default()
    });
    let errors = capture(&handle, EventKind::Error);

    let result = handle.initialize().await;
    let err = result.unwrap_err();
    assert!(err.is_container_not_found());
    assert!(!handle.is_initialized());

    // No DOM mutation, no registry entry.
    assert_eq!(manager.with_doc(|doc| doc.tree.len()), before);
    assert!(manager.registry().is_empty());

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].detail["phase"], "initialize");
}

#[tokio::test]
async fn test_embed_never_returns_error_on_auto_init_failure() {
    let manager = WidgetManager::new();
    // No container exists; embed must still hand back a handle.
    let handle = manager.embed("#missing", WidgetConfig::default()).await;
    assert!(!handle.is_initialized());
}

#[tokio::test]
async fn test_two_instances_are_isolated() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| {
        doc.create_container("div", "host-a");
        doc.create_container("div", "host-b");
    });

    let a = manager
        .embed(
            "#host-a",
            WidgetConfig {
                css_prefix: "a-".into(),
                ..WidgetConfig::default()
            },
        )
        .await;
    let b = manager
        .embed(
            "#host-b",
            WidgetConfig {
                css_prefix: "b-".into(),
                ..WidgetConfig::default()
            },
        )
        .await;

    assert!(a.is_initialized() && b.is_initialized());
    assert_ne!(a.instance_id(), b.instance_id());

    let ctx_a = a.dom_context().unwrap();
    let ctx_b = b.dom_context().unwrap();
    manager.with_doc(|doc| {
        // Each context sees exactly its own widget root.
        assert_eq!(ctx_a.query_all(&doc.tree, ".a-widget").len(), 1);
        assert_eq!(ctx_a.query_all(&doc.tree, ".b-widget").len(), 0);
        assert_eq!(ctx_b.query_all(&doc.tree, ".b-widget").len(), 1);
        assert_eq!(ctx_b.query_all(&doc.tree, ".a-widget").len(), 0);

        // Scoped markup carries each instance's marker.
        let root_a = ctx_a.query(&doc.tree, ".a-widget").unwrap();
        assert_eq!(doc.tree.attr(root_a, "data-instance"), Some(a.instance_id()));
    });

    assert_eq!(manager.registry().len(), 2);
}

#[tokio::test]
async fn test_shadow_instances_get_distinct_roots() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| {
        doc.create_container("div", "host-a");
        doc.create_container("div", "host-b");
    });

    let shadow_config = || WidgetConfig {
        enable_shadow_dom: true,
        ..WidgetConfig::default()
    };
    let a = manager.embed("#host-a", shadow_config()).await;
    let b = manager.embed("#host-b", shadow_config()).await;

    let ctx_a = a.dom_context().unwrap();
    let ctx_b = b.dom_context().unwrap();
    assert!(ctx_a.is_shadow() && ctx_b.is_shadow());
    assert_ne!(ctx_a.root(), ctx_b.root());

    // Each shadow root holds its own style element; the host head has
    // no shared tag.
    manager.with_doc(|doc| {
        assert!(ctx_a.query(&doc.tree, "style").is_some());
        assert!(ctx_b.query(&doc.tree, "style").is_some());
        assert!(doc.tree.children(doc.head()).is_empty());
    });
    assert_eq!(manager.style_ref_count("c4ai-"), 0);
}

#[tokio::test]
async fn test_container_exclusive_ownership() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let first = manager.embed("#host", WidgetConfig::default()).await;
    assert!(first.is_initialized());

    let second = manager.embed("#host", WidgetConfig::default()).await;
    assert!(!second.is_initialized());

    // Destroying the owner frees the container for a new embed.
    first.destroy();
    let third = manager.embed("#host", WidgetConfig::default()).await;
    assert!(third.is_initialized());
}

#[tokio::test]
async fn test_destroy_is_idempotent_and_cleans_up() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.embed("#host", WidgetConfig::default()).await;
    let destroyed = capture(&handle, EventKind::Destroyed);
    let id = handle.instance_id().to_string();
    assert!(manager.registry().contains(&id));

    handle.destroy();
    handle.destroy();

    assert!(!manager.registry().contains(&id));
    assert!(!handle.is_initialized());
    assert_eq!(destroyed.lock().unwrap().len(), 1);

    // The wrapper left the container subtree.
    manager.with_doc(|doc| {
        let container = doc.get_element_by_id("host").unwrap();
        assert!(doc.tree.children(container).is_empty());
    });
}

#[tokio::test]
async fn test_shared_style_tag_is_reference_counted() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| {
        doc.create_container("div", "host-a");
        doc.create_container("div", "host-b");
    });

    let a = manager.embed("#host-a", WidgetConfig::default()).await;
    let b = manager.embed("#host-b", WidgetConfig::default()).await;
    assert_eq!(manager.style_ref_count("c4ai-"), 2);
    manager.with_doc(|doc| assert_eq!(doc.tree.children(doc.head()).len(), 1));

    a.destroy();
    // One user left: the tag survives.
    assert_eq!(manager.style_ref_count("c4ai-"), 1);
    manager.with_doc(|doc| assert_eq!(doc.tree.children(doc.head()).len(), 1));

    b.destroy();
    assert_eq!(manager.style_ref_count("c4ai-"), 0);
    manager.with_doc(|doc| assert!(doc.tree.children(doc.head()).is_empty()));
}

#[tokio::test]
async fn test_double_initialize_is_a_noop() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.embed("#host", WidgetConfig::default()).await;
    let before = manager.with_doc(|doc| doc.tree.len());

    handle.initialize().await.unwrap();
    assert_eq!(manager.with_doc(|doc| doc.tree.len()), before);
}

#[tokio::test]
async fn test_inline_handlers_are_rebound_per_instance() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.embed("#host", WidgetConfig::default()).await;
    let ctx = handle.dom_context().unwrap();
    let expected = format!("AlcoveRegistry.get('{}').triggerScraping()", handle.instance_id());

    manager.with_doc(|doc| {
        let buttons = ctx.query_all(&doc.tree, ".c4ai-btn");
        assert!(!buttons.is_empty());
        let onclick = buttons
            .iter()
            .find_map(|&b| doc.tree.attr(b, "onclick").filter(|v| v.contains("triggerScraping()")))
            .unwrap();
        assert_eq!(onclick, expected);
    });
}

#[tokio::test]
async fn test_registry_invoke_routes_to_instance() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.embed("#host", WidgetConfig::default()).await;
    let paused = capture(&handle, EventKind::JobPaused);

    assert!(manager.invoke(handle.instance_id(), "pauseJob"));
    assert_eq!(paused.lock().unwrap().len(), 1);

    assert!(!manager.invoke("nonexistent", "pauseJob"));
}

#[tokio::test]
async fn test_configure_merges_and_emits() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager.embed("#host", WidgetConfig::default()).await;
    let configured = capture(&handle, EventKind::Configured);

    handle
        .configure(ConfigPatch {
            results_per_page: Some(50),
            theme: Some(Theme::Compact),
            ..Default::default()
        })
        .await
        .unwrap();

    let config = handle.config();
    assert_eq!(config.results_per_page, 50);
    assert_eq!(config.theme, Theme::Compact);
    assert_eq!(config.css_prefix, "c4ai-");
    assert_eq!(configured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_operations_rejected_before_initialize() {
    let manager = WidgetManager::new();
    let handle = manager.create(scoped_config());

    let result = handle.trigger_quick_scraping().await;
    assert!(!result.success);
    assert_eq!(result.status_text, "Not Ready");
}

#[tokio::test]
async fn test_destroy_cancels_auto_refresh() {
    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));

    let handle = manager
        .embed(
            "#host",
            WidgetConfig {
                auto_refresh: true,
                refresh_interval: Duration::from_millis(100),
                // Closed local port: a tick would fail fast and emit an
                // error event.
                api_url: "http://127.0.0.1:1".into(),
                ..WidgetConfig::default()
            },
        )
        .await;

    let errors = capture(&handle, EventKind::Error);
    handle.destroy();

    // The timer died with the instance: no tick, no error events.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(errors.lock().unwrap().is_empty());
}

/// Serve `n` canned HTTP responses on a local port.
async fn canned_server(n: usize, status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for _ in 0..n {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let read = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..read]);
                if read == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            // Drain an advertised JSON body if one is coming.
            let text = String::from_utf8_lossy(&request).to_string();
            if let Some(len) = text
                .lines()
                .find(|l| l.to_ascii_lowercase().starts_with("content-length:"))
                .and_then(|l| l.split(':').nth(1))
                .and_then(|v| v.trim().parse::<usize>().ok())
            {
                let header_end = request
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .map(|p| p + 4)
                    .unwrap();
                while request.len() - header_end < len {
                    let read = socket.read(&mut buf).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..read]);
                }
            }
            requests.push(String::from_utf8_lossy(&request).to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
        requests
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn test_quick_scrape_posts_fixed_body_and_emits() {
    // One response for the trigger, one for the follow-up status pull.
    let (base, server) = canned_server(
        2,
        "200 OK",
        r#"{"success":true,"job_id":"job_9","scraping_available":true}"#,
    )
    .await;

    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));
    let handle = manager
        .embed(
            "#host",
            WidgetConfig {
                api_url: base,
                ..WidgetConfig::default()
            },
        )
        .await;

    let started = capture(&handle, EventKind::ScrapingStarted);
    let result = handle.trigger_quick_scraping().await;
    assert!(result.success);

    let started = started.lock().unwrap();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].detail["jobId"], "job_9");

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("POST /api/scraper/trigger"));
    let body = requests[0].split("\r\n\r\n").nth(1).unwrap();
    let posted: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(
        posted,
        serde_json::json!({
            "max_items": 100,
            "include_media": false,
            "include_documents": false,
            "include_metadata": true,
        })
    );
    assert!(requests[1].starts_with("GET /api/scraper/status"));
}

#[tokio::test]
async fn test_load_results_updates_state_and_dom() {
    let (base, _server) = canned_server(
        1,
        "200 OK",
        r#"{"results":[{"title":"First"},{"title":"Second"}],"total":2}"#,
    )
    .await;

    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));
    let handle = manager
        .embed(
            "#host",
            WidgetConfig {
                api_url: base,
                ..WidgetConfig::default()
            },
        )
        .await;

    let result = handle.load_results(1).await;
    assert!(result.success);
    assert_eq!(handle.current_results().len(), 2);
    assert_eq!(handle.current_page(), 1);

    let ctx = handle.dom_context().unwrap();
    manager.with_doc(|doc| {
        let list = ctx.query(&doc.tree, ".c4ai-results").unwrap();
        let rows = doc.tree.children(list);
        assert_eq!(rows.len(), 2);
        assert_eq!(doc.tree.text_content(rows[0]), "First");
    });
}

#[tokio::test]
async fn test_api_failure_emits_error_event() {
    let (base, _server) = canned_server(1, "500 Internal Server Error", r#"{"error":"db down"}"#).await;

    let manager = WidgetManager::new();
    manager.with_doc_mut(|doc| doc.create_container("div", "host"));
    let handle = manager
        .embed(
            "#host",
            WidgetConfig {
                api_url: base,
                ..WidgetConfig::default()
            },
        )
        .await;

    let errors = capture(&handle, EventKind::Error);
    let result = handle.display_stats().await;
    assert!(!result.success);
    assert_eq!(result.status, 500);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].detail["error"], "db down");
    assert_eq!(errors[0].detail["action"], "stats");
}
