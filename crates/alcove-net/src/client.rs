//! API gateway client
//!
//! Normalizes every call against the remote scraping API into an
//! [`ApiResult`] and races each request against a cancellation token
//! so a destroyed instance never has work land after teardown.

use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::endpoints::{Endpoint, EndpointMap};
use crate::models::{ResultQuery, ScrapeConfig, SearchQuery};
use crate::{normalize_response, ApiResult, NetError};

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

/// Per-request options.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
    pub query: Vec<(&'static str, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: &impl serde::Serialize) -> Self {
        Self {
            method: Method::Post,
            body: serde_json::to_string(body).ok(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Vec<(&'static str, String)>) -> Self {
        self.query = query;
        self
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// API origin, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Path prefix in front of every endpoint
    pub api_prefix: String,
    /// Headers added to every request
    pub headers: Vec<(String, String)>,
    /// Endpoint-name overrides
    pub endpoints: EndpointMap,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            api_prefix: "/api/scraper".into(),
            headers: Vec::new(),
            endpoints: EndpointMap::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Partial configuration update applied by `configure()`.
#[derive(Debug, Default)]
pub struct ClientPatch {
    pub base_url: Option<String>,
    pub api_prefix: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
    pub endpoints: Option<EndpointMap>,
}

/// Client builder
pub struct ApiClientBuilder {
    config: ApiClientConfig,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            config: ApiClientConfig::default(),
        }
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.config.base_url = url.to_string();
        self
    }

    pub fn api_prefix(mut self, prefix: &str) -> Self {
        self.config.api_prefix = prefix.to_string();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.config.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn endpoint(mut self, endpoint: Endpoint, path: &str) -> Self {
        self.config.endpoints.set(endpoint, path);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ApiClient, NetError> {
        ApiClient::new(self.config)
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Gateway client bound to one widget instance.
pub struct ApiClient {
    config: Mutex<ApiClientConfig>,
    http: reqwest::Client,
    cancel: CancellationToken,
}

impl ApiClient {
    /// Create a client, validating the base URL.
    pub fn new(config: ApiClientConfig) -> Result<Self, NetError> {
        Url::parse(&config.base_url)
            .map_err(|e| NetError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        Ok(Self {
            config: Mutex::new(config),
            http: reqwest::Client::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Replace base URL / headers / endpoint map in place. In-flight
    /// requests keep the snapshot they started with.
    pub fn configure(&self, patch: ClientPatch) {
        let mut config = self.config.lock().expect("client config poisoned");
        if let Some(base_url) = patch.base_url {
            if Url::parse(&base_url).is_ok() {
                config.base_url = base_url;
            } else {
                tracing::warn!(url = %base_url, "ignoring invalid base URL update");
            }
        }
        if let Some(api_prefix) = patch.api_prefix {
            config.api_prefix = api_prefix;
        }
        if let Some(headers) = patch.headers {
            config.headers = headers;
        }
        if let Some(endpoints) = patch.endpoints {
            config.endpoints = endpoints;
        }
    }

    /// Token cancelled when the owning instance is destroyed.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every outstanding and future request.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    /// Effective URL for an endpoint (base + prefix + path + query).
    fn build_url(&self, path: &str, query: &[(&'static str, String)]) -> String {
        let config = self.config.lock().expect("client config poisoned");
        let mut url = format!(
            "{}{}{}",
            config.base_url.trim_end_matches('/'),
            config.api_prefix,
            path
        );
        if !query.is_empty() {
            let encoded: String = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    fn snapshot(&self) -> (Vec<(String, String)>, Duration) {
        let config = self.config.lock().expect("client config poisoned");
        (config.headers.clone(), config.timeout)
    }

    /// Issue a request against an endpoint path.
    ///
    /// Always resolves: transport and parse failures are folded into
    /// the result shape, cancellation yields [`ApiResult::cancelled`].
    pub async fn request(&self, path: &str, options: RequestOptions) -> ApiResult {
        let url = self.build_url(path, &options.query);
        let (headers, timeout) = self.snapshot();

        let work = async {
            let mut req = match options.method {
                Method::Get => self.http.get(&url),
                Method::Post => self.http.post(&url),
                Method::Put => self.http.put(&url),
                Method::Delete => self.http.delete(&url),
            };
            for (name, value) in &headers {
                req = req.header(name.as_str(), value.as_str());
            }
            if let Some(body) = options.body {
                req = req.header("Content-Type", "application/json").body(body);
            }
            req = req.timeout(timeout);

            match req.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let status_text = response
                        .status()
                        .canonical_reason()
                        .unwrap_or("Unknown")
                        .to_string();
                    match response.text().await {
                        Ok(body) => normalize_response(status, &status_text, &body),
                        Err(e) => ApiResult::network_error(e.to_string()),
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "request failed");
                    ApiResult::network_error(e.to_string())
                }
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => ApiResult::cancelled(),
            result = work => result,
        }
    }

    async fn call(&self, endpoint: Endpoint, options: RequestOptions) -> ApiResult {
        let path = {
            let config = self.config.lock().expect("client config poisoned");
            config.endpoints.path(endpoint).to_string()
        };
        let result = self.request(&path, options).await;
        if !result.success {
            tracing::debug!(
                endpoint = endpoint.name(),
                status = result.status,
                "gateway call failed"
            );
        }
        result
    }

    /// `GET {prefix}/health`
    pub async fn health(&self) -> ApiResult {
        self.call(Endpoint::Health, RequestOptions::get()).await
    }

    /// `POST {prefix}/trigger`
    pub async fn trigger(&self, config: &ScrapeConfig) -> ApiResult {
        self.call(Endpoint::Trigger, RequestOptions::post_json(config))
            .await
    }

    /// `GET {prefix}/status`
    pub async fn job_status(&self) -> ApiResult {
        self.call(Endpoint::Status, RequestOptions::get()).await
    }

    /// `GET {prefix}/results?page&limit&search&category`
    pub async fn results(&self, query: &ResultQuery) -> ApiResult {
        self.call(
            Endpoint::Results,
            RequestOptions::get().with_query(query.to_pairs()),
        )
        .await
    }

    /// `GET {prefix}/categories`
    pub async fn categories(&self) -> ApiResult {
        self.call(Endpoint::Categories, RequestOptions::get()).await
    }

    /// `GET {prefix}/stats`
    pub async fn stats(&self) -> ApiResult {
        self.call(Endpoint::Stats, RequestOptions::get()).await
    }

    /// `GET {prefix}/search?q&category&page&limit`
    pub async fn search(&self, query: &SearchQuery) -> ApiResult {
        self.call(
            Endpoint::Search,
            RequestOptions::get().with_query(query.to_pairs()),
        )
        .await
    }
}
