//! Widget configuration
//!
//! The configuration surface accepted by `embed()`/`create()` and the
//! shallow-merge patch applied by `configure()`.

use std::time::Duration;

use alcove_dom::ContainerTarget;
use alcove_net::EndpointMap;

/// Visual theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Default,
    Compact,
}

/// Configuration for one widget instance.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Embed target; `embed()` overrides this with its own argument.
    pub container: Option<ContainerTarget>,
    /// API origin
    pub api_url: String,
    /// Path prefix in front of every endpoint
    pub api_prefix: String,
    pub theme: Theme,
    /// Prefix for every generated class name and the shared style tag
    pub css_prefix: String,
    /// Prefer a shadow root over the scoped-class wrapper
    pub enable_shadow_dom: bool,
    /// Run initialization from `embed()`
    pub auto_init: bool,
    /// Periodically refresh the status display
    pub auto_refresh: bool,
    pub refresh_interval: Duration,
    pub results_per_page: u32,
    /// Extra headers for every API request
    pub headers: Vec<(String, String)>,
    /// Endpoint-name overrides for the gateway client
    pub endpoints: EndpointMap,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            container: None,
            api_url: "http://localhost:8000".into(),
            api_prefix: "/api/scraper".into(),
            theme: Theme::Default,
            css_prefix: "c4ai-".into(),
            enable_shadow_dom: false,
            auto_init: true,
            auto_refresh: false,
            refresh_interval: Duration::from_secs(30),
            results_per_page: 10,
            headers: Vec::new(),
            endpoints: EndpointMap::new(),
        }
    }
}

impl WidgetConfig {
    /// Shallow-merge a patch into this config.
    pub fn merge(&mut self, patch: &ConfigPatch) {
        if let Some(api_url) = &patch.api_url {
            self.api_url = api_url.clone();
        }
        if let Some(api_prefix) = &patch.api_prefix {
            self.api_prefix = api_prefix.clone();
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(auto_refresh) = patch.auto_refresh {
            self.auto_refresh = auto_refresh;
        }
        if let Some(refresh_interval) = patch.refresh_interval {
            self.refresh_interval = refresh_interval;
        }
        if let Some(results_per_page) = patch.results_per_page {
            self.results_per_page = results_per_page;
        }
        if let Some(headers) = &patch.headers {
            self.headers = headers.clone();
        }
        if let Some(endpoints) = &patch.endpoints {
            self.endpoints = endpoints.clone();
        }
    }
}

/// Partial update for `configure()`.
///
/// The isolation-defining fields (`css_prefix`, `enable_shadow_dom`,
/// `container`) are deliberately absent: the boundary is erected once
/// and only a destroy/re-embed changes it.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub api_url: Option<String>,
    pub api_prefix: Option<String>,
    pub theme: Option<Theme>,
    pub auto_refresh: Option<bool>,
    pub refresh_interval: Option<Duration>,
    pub results_per_page: Option<u32>,
    pub headers: Option<Vec<(String, String)>>,
    pub endpoints: Option<EndpointMap>,
    /// Reset and re-run initialization after merging
    pub reinitialize: bool,
}
