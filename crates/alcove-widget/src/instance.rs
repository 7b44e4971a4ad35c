//! Widget instance
//!
//! One embedded occurrence of the widget: its id, boundary, gateway
//! client, handler surface, events, and lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use alcove_dom::{erect_boundary, DomContext, DomError, IsolationRequest, NodeId};
use alcove_net::{
    ApiClient, ApiClientConfig, ApiResult, ClientPatch, ResultQuery, ResultsPage, ScrapeConfig,
    ScraperStats, SearchQuery,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::bridge::rewrite_inline_handlers;
use crate::config::{ConfigPatch, WidgetConfig};
use crate::events::{EventHub, EventKind, ListenerId, WidgetEvent};
use crate::manager::ManagerShared;
use crate::registry::HandlerSurface;
use crate::ui::{self, UiRefs};
use crate::WidgetError;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

fn next_instance_id(prefix: &str) -> String {
    format!("{}w{}", prefix, NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
}

/// DOM-side state of one instance.
#[derive(Default)]
struct DomState {
    container: Option<NodeId>,
    context: Option<DomContext>,
    ui: Option<UiRefs>,
    initialized: bool,
    style_acquired: bool,
    destroyed: bool,
}

pub(crate) struct InstanceInner {
    id: String,
    shared: Arc<ManagerShared>,
    config: Mutex<WidgetConfig>,
    state: Mutex<DomState>,
    api: Mutex<Option<Arc<ApiClient>>>,
    events: EventHub,
    cancel: CancellationToken,
    refresh_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    results: Mutex<Vec<Value>>,
    current_page: Mutex<u32>,
    load_epoch: AtomicU64,
}

/// Live handle to an embedded widget instance.
#[derive(Clone)]
pub struct WidgetHandle {
    inner: Arc<InstanceInner>,
}

impl WidgetHandle {
    pub(crate) fn create(shared: Arc<ManagerShared>, config: WidgetConfig) -> Self {
        let id = next_instance_id(&config.css_prefix);
        tracing::debug!(instance = %id, "instance created");
        Self {
            inner: Arc::new(InstanceInner {
                id,
                shared,
                config: Mutex::new(config),
                state: Mutex::new(DomState::default()),
                api: Mutex::new(None),
                events: EventHub::new(),
                cancel: CancellationToken::new(),
                refresh_task: Mutex::new(None),
                results: Mutex::new(Vec::new()),
                current_page: Mutex::new(1),
                load_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Process-unique instance id (also the CSS scoping key).
    pub fn instance_id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().expect("state poisoned").initialized
    }

    /// Effective configuration snapshot.
    pub fn config(&self) -> WidgetConfig {
        self.inner.config.lock().expect("config poisoned").clone()
    }

    /// The instance's isolation context, once initialized.
    pub fn dom_context(&self) -> Option<DomContext> {
        self.inner.state.lock().expect("state poisoned").context
    }

    /// Attach an event listener.
    pub fn add_event_listener<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        self.inner.events.add_listener(kind, listener)
    }

    /// Detach an event listener.
    pub fn remove_event_listener(&self, kind: EventKind, id: ListenerId) {
        self.inner.events.remove_listener(kind, id);
    }

    /// Most recently loaded result page.
    pub fn current_results(&self) -> Vec<Value> {
        self.inner.results.lock().expect("results poisoned").clone()
    }

    pub fn current_page(&self) -> u32 {
        *self.inner.current_page.lock().expect("page poisoned")
    }

    /// Run the full setup sequence.
    ///
    /// Idempotent: a second call warns and resolves without side
    /// effects. Failures are emitted as `error` events in addition to
    /// the returned error.
    pub async fn initialize(&self) -> Result<(), WidgetError> {
        {
            let state = self.inner.state.lock().expect("state poisoned");
            if state.destroyed {
                let err = WidgetError::Destroyed;
                drop(state);
                self.emit_error("initialize", &err.to_string());
                return Err(err);
            }
            if state.initialized {
                tracing::warn!(instance = %self.inner.id, "initialize called twice");
                return Ok(());
            }
        }

        match self.try_initialize() {
            Ok(()) => {
                self.start_auto_refresh();
                self.inner
                    .events
                    .emit(&self.inner.id, EventKind::Initialized, json!({}));
                Ok(())
            }
            Err(e) => {
                self.emit_error("initialize", &e.to_string());
                Err(e)
            }
        }
    }

    /// The fallible part of initialization: container resolution,
    /// boundary, markup, gateway client, registry.
    fn try_initialize(&self) -> Result<(), WidgetError> {
        let inner = &self.inner;
        let config = inner.config.lock().expect("config poisoned").clone();

        let target = config.container.clone().ok_or_else(|| {
            WidgetError::Dom(DomError::ContainerNotFound("no container configured".into()))
        })?;

        // Resolve first: a bad selector must fail before any mutation.
        let container = {
            let doc = inner.shared.doc.lock().expect("document poisoned");
            doc.resolve_container(&target)?
        };
        inner.shared.claim_container(container, &inner.id)?;

        let raw_css = ui::widget_css(&config.css_prefix);
        let scoped = inner.shared.scope_engine.scope(&raw_css, &inner.id);
        let first_injection = inner.shared.ledger.first_injection(&scoped, &inner.id);

        let boundary = {
            let mut doc = inner.shared.doc.lock().expect("document poisoned");
            let mut styles = inner.shared.styles.lock().expect("style registry poisoned");
            erect_boundary(
                &mut doc,
                &mut styles,
                IsolationRequest {
                    container,
                    instance_id: &inner.id,
                    use_shadow: config.enable_shadow_dom,
                    raw_css: &raw_css,
                    scoped_css: first_injection.then_some(scoped.as_ref()),
                    css_prefix: &config.css_prefix,
                },
            )
        };
        let context = match boundary {
            Ok(ctx) => ctx,
            Err(e) => {
                inner.shared.release_container(container, &inner.id);
                return Err(e.into());
            }
        };

        let refs = {
            let mut doc = inner.shared.doc.lock().expect("document poisoned");
            let refs = ui::build_markup(
                &mut doc.tree,
                context.root(),
                &config.css_prefix,
                config.theme,
                &inner.id,
            )?;
            rewrite_inline_handlers(&mut doc.tree, &context, &inner.id);
            refs
        };

        self.ensure_api_client(&config)?;
        inner.shared.registry.register(&inner.id, self.handler_surface());

        let mut state = inner.state.lock().expect("state poisoned");
        state.container = Some(container);
        state.context = Some(context);
        state.ui = Some(refs);
        state.style_acquired = !context.is_shadow();
        state.initialized = true;
        Ok(())
    }

    /// Construct the gateway client on first use, or re-point the
    /// existing one at the current config.
    fn ensure_api_client(&self, config: &WidgetConfig) -> Result<(), WidgetError> {
        let mut slot = self.inner.api.lock().expect("api slot poisoned");
        if let Some(api) = slot.clone() {
            api.configure(ClientPatch {
                base_url: Some(config.api_url.clone()),
                api_prefix: Some(config.api_prefix.clone()),
                headers: Some(config.headers.clone()),
                endpoints: Some(config.endpoints.clone()),
            });
        } else {
            let api = ApiClient::new(ApiClientConfig {
                base_url: config.api_url.clone(),
                api_prefix: config.api_prefix.clone(),
                headers: config.headers.clone(),
                endpoints: config.endpoints.clone(),
                ..ApiClientConfig::default()
            })?;
            *slot = Some(Arc::new(api));
        }
        Ok(())
    }

    /// The callable surface legacy inline handlers route through.
    fn handler_surface(&self) -> HandlerSurface {
        let mut surface = HandlerSurface::new();

        let spawn_op = |weak: Weak<InstanceInner>, op: fn(WidgetHandle)| {
            move || {
                if let Some(inner) = weak.upgrade() {
                    op(WidgetHandle { inner });
                }
            }
        };

        let weak = Arc::downgrade(&self.inner);
        surface.bind(
            "triggerScraping",
            spawn_op(weak.clone(), |handle| {
                tokio::spawn(async move {
                    handle.trigger_scraping(None).await;
                });
            }),
        );
        surface.bind(
            "triggerQuickScraping",
            spawn_op(weak.clone(), |handle| {
                tokio::spawn(async move {
                    handle.trigger_quick_scraping().await;
                });
            }),
        );
        surface.bind(
            "refreshStatus",
            spawn_op(weak.clone(), |handle| {
                tokio::spawn(async move {
                    handle.refresh_status().await;
                });
            }),
        );
        surface.bind(
            "displayStats",
            spawn_op(weak.clone(), |handle| {
                tokio::spawn(async move {
                    handle.display_stats().await;
                });
            }),
        );
        surface.bind(
            "pauseJob",
            spawn_op(weak, |handle| {
                handle.pause_job();
            }),
        );
        surface
    }

    /// Periodic status refresh bound to the instance lifetime.
    fn start_auto_refresh(&self) {
        let config = self.inner.config.lock().expect("config poisoned");
        if !config.auto_refresh {
            return;
        }
        let interval = config.refresh_interval;
        drop(config);

        let token = self.inner.cancel.child_token();
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                let Some(inner) = weak.upgrade() else { break };
                WidgetHandle { inner }.refresh_status().await;
            }
        });

        let mut slot = self.inner.refresh_task.lock().expect("refresh slot poisoned");
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    fn api(&self) -> Option<Arc<ApiClient>> {
        self.inner.api.lock().expect("api slot poisoned").clone()
    }

    fn ready_api(&self) -> Result<Arc<ApiClient>, ApiResult> {
        if !self.is_initialized() {
            return Err(not_ready());
        }
        self.api().ok_or_else(not_ready)
    }

    fn emit_error(&self, phase: &str, message: &str) {
        self.inner.events.emit(
            &self.inner.id,
            EventKind::Error,
            json!({ "error": message, "phase": phase }),
        );
    }

    fn report_api_failure(&self, action: &str, result: &ApiResult) {
        // A cancelled request means teardown is in progress; reporting
        // it as an instance error would outlive the instance.
        if result.status_text == "Cancelled" {
            return;
        }
        let message = result
            .error
            .clone()
            .unwrap_or_else(|| result.status_text.clone());
        self.inner.events.emit(
            &self.inner.id,
            EventKind::Error,
            json!({ "error": message, "action": action, "status": result.status }),
        );
    }

    /// Start a scrape job.
    pub async fn trigger_scraping(&self, job: Option<ScrapeConfig>) -> ApiResult {
        let api = match self.ready_api() {
            Ok(api) => api,
            Err(r) => return r,
        };
        let job = job.unwrap_or_default();
        let result = api.trigger(&job).await;

        if result.success {
            let job_id = result
                .data
                .as_ref()
                .and_then(|d| d.get("job_id"))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            self.inner.events.emit(
                &self.inner.id,
                EventKind::ScrapingStarted,
                json!({ "jobId": job_id }),
            );
            self.refresh_status().await;
        } else {
            self.report_api_failure("trigger", &result);
        }
        result
    }

    /// Start the fixed quick-scrape job. The body is always the
    /// quick-scrape defaults, regardless of instance configuration.
    pub async fn trigger_quick_scraping(&self) -> ApiResult {
        self.trigger_scraping(Some(ScrapeConfig::quick())).await
    }

    /// Refresh the status badge from the status endpoint.
    pub async fn refresh_status(&self) -> ApiResult {
        let api = match self.ready_api() {
            Ok(api) => api,
            Err(r) => return r,
        };
        let result = api.job_status().await;

        if result.success {
            let payload = result.data.clone().unwrap_or(Value::Null);
            let prefix = self.config().css_prefix;
            let badge = self.ui_refs().map(|r| r.status_badge);
            if let Some(badge) = badge {
                let mut doc = self.inner.shared.doc.lock().expect("document poisoned");
                ui::render_status(&mut doc.tree, badge, &prefix, &payload);
            }
        } else {
            self.report_api_failure("status", &result);
        }
        result
    }

    /// Fetch and render stats; emits `statsDisplayed` on success.
    pub async fn display_stats(&self) -> ApiResult {
        let api = match self.ready_api() {
            Ok(api) => api,
            Err(r) => return r,
        };
        let result = api.stats().await;

        if result.success {
            let stats: ScraperStats = result.parse().unwrap_or_default();
            if let Some(bar) = self.ui_refs().map(|r| r.stats_bar) {
                let mut doc = self.inner.shared.doc.lock().expect("document poisoned");
                ui::render_stats(&mut doc.tree, bar, &stats);
            }
            self.inner.events.emit(
                &self.inner.id,
                EventKind::StatsDisplayed,
                json!({
                    "totalResults": stats.total_results,
                    "totalJobs": stats.total_jobs,
                }),
            );
        } else {
            self.report_api_failure("stats", &result);
        }
        result
    }

    /// Load one page of results.
    ///
    /// Overlapping loads are serialized by epoch: a response belonging
    /// to a superseded load is returned but never applied.
    pub async fn load_results(&self, page: u32) -> ApiResult {
        let api = match self.ready_api() {
            Ok(api) => api,
            Err(r) => return r,
        };
        let epoch = self.inner.load_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let limit = self.config().results_per_page;
        let result = api.results(&ResultQuery::page(page, limit)).await;

        if self.inner.load_epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(instance = %self.inner.id, page, "stale result load dropped");
            return result;
        }
        self.apply_results(page, &result, "results");
        result
    }

    /// Search results; renders like a page load.
    pub async fn search_results(&self, query: &str) -> ApiResult {
        let api = match self.ready_api() {
            Ok(api) => api,
            Err(r) => return r,
        };
        let epoch = self.inner.load_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let limit = self.config().results_per_page;
        let search = SearchQuery {
            q: query.to_string(),
            category: None,
            page: 1,
            limit,
        };
        let result = api.search(&search).await;

        if self.inner.load_epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(instance = %self.inner.id, query, "stale search dropped");
            return result;
        }
        self.apply_results(1, &result, "search");
        result
    }

    fn apply_results(&self, page: u32, result: &ApiResult, action: &str) {
        if !result.success {
            self.report_api_failure(action, result);
            return;
        }
        let page_data = result
            .data
            .as_ref()
            .map(ResultsPage::from_value)
            .unwrap_or_default();

        *self.inner.results.lock().expect("results poisoned") = page_data.results.clone();
        *self.inner.current_page.lock().expect("page poisoned") = page;

        if let Some(refs) = self.ui_refs() {
            let mut doc = self.inner.shared.doc.lock().expect("document poisoned");
            ui::render_results(
                &mut doc.tree,
                refs.results_list,
                refs.pager_label,
                &page_data.results,
                page,
            );
        }
    }

    /// Mark the job display paused and notify listeners.
    pub fn pause_job(&self) {
        if let Some(badge) = self.ui_refs().map(|r| r.status_badge) {
            let mut doc = self.inner.shared.doc.lock().expect("document poisoned");
            ui::set_text(&mut doc.tree, badge, "status: paused");
        }
        self.inner
            .events
            .emit(&self.inner.id, EventKind::JobPaused, json!({}));
    }

    fn ui_refs(&self) -> Option<UiRefs> {
        self.inner.state.lock().expect("state poisoned").ui
    }

    /// Shallow-merge new options into the config.
    ///
    /// With `reinitialize` the boundary is torn down and setup re-run
    /// under the merged config.
    pub async fn configure(&self, patch: ConfigPatch) -> Result<(), WidgetError> {
        let reinitialize = patch.reinitialize;
        {
            let mut config = self.inner.config.lock().expect("config poisoned");
            config.merge(&patch);
        }
        if let Some(api) = self.api() {
            api.configure(ClientPatch {
                base_url: patch.api_url.clone(),
                api_prefix: patch.api_prefix.clone(),
                headers: patch.headers.clone(),
                endpoints: patch.endpoints.clone(),
            });
        }

        let result = if reinitialize {
            self.teardown_dom();
            self.inner.state.lock().expect("state poisoned").initialized = false;
            self.initialize().await
        } else {
            Ok(())
        };

        self.inner.events.emit(
            &self.inner.id,
            EventKind::Configured,
            json!({ "reinitialized": reinitialize }),
        );
        result
    }

    /// Remove this instance's DOM, style reference, registry entry,
    /// and container claim. Does not mark the instance destroyed.
    fn teardown_dom(&self) {
        let (container, context, style_acquired, prefix) = {
            let mut state = self.inner.state.lock().expect("state poisoned");
            let config = self.inner.config.lock().expect("config poisoned");
            let snapshot = (
                state.container.take(),
                state.context.take(),
                state.style_acquired,
                config.css_prefix.clone(),
            );
            state.ui = None;
            state.style_acquired = false;
            snapshot
        };

        if let Some(task) = self
            .inner
            .refresh_task
            .lock()
            .expect("refresh slot poisoned")
            .take()
        {
            task.abort();
        }

        {
            let mut doc = self.inner.shared.doc.lock().expect("document poisoned");
            match context {
                Some(DomContext::Scoped(wrapper)) => doc.tree.detach(wrapper),
                Some(DomContext::Shadow(_)) => {
                    if let Some(container) = container {
                        doc.tree.remove_shadow(container);
                    }
                }
                None => {}
            }
            if style_acquired {
                let mut styles = self.inner.shared.styles.lock().expect("style registry poisoned");
                styles.release(&mut doc, &prefix);
            }
        }

        self.inner.shared.ledger.forget_instance(&self.inner.id);
        self.inner.shared.registry.unregister(&self.inner.id);
        if let Some(container) = container {
            self.inner.shared.release_container(container, &self.inner.id);
        }
    }

    /// Tear the instance down.
    ///
    /// Cancels in-flight requests and the refresh timer, removes the
    /// injected DOM and every registry record, then emits `destroyed`.
    /// Safe to call repeatedly; the second call is a no-op.
    pub fn destroy(&self) {
        {
            let mut state = self.inner.state.lock().expect("state poisoned");
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }

        self.inner.cancel.cancel();
        if let Some(api) = self.api() {
            api.cancel_all();
        }
        self.teardown_dom();
        self.inner.state.lock().expect("state poisoned").initialized = false;

        self.inner
            .events
            .emit(&self.inner.id, EventKind::Destroyed, json!({}));
        tracing::debug!(instance = %self.inner.id, "instance destroyed");
    }
}

fn not_ready() -> ApiResult {
    ApiResult {
        success: false,
        data: None,
        status: 0,
        status_text: "Not Ready".into(),
        error: Some("instance not initialized".into()),
    }
}
