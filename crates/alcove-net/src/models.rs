//! Wire models for the scraping API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scrape job configuration posted to the trigger endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub max_items: u32,
    pub include_media: bool,
    pub include_documents: bool,
    pub include_metadata: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            include_media: true,
            include_documents: true,
            include_metadata: true,
        }
    }
}

impl ScrapeConfig {
    /// The fixed quick-scrape job: a small metadata-only pass. Not
    /// affected by instance configuration.
    pub fn quick() -> Self {
        Self {
            max_items: 100,
            include_media: false,
            include_documents: false,
            include_metadata: true,
        }
    }
}

/// Trigger endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub job_id: String,
    #[serde(default)]
    pub message: String,
}

/// Health endpoint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Error,
}

/// Health endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    #[serde(default)]
    pub message: Option<String>,
}

/// Status endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub current_job: Option<Value>,
    #[serde(default)]
    pub last_successful_scrape: Option<Value>,
    #[serde(default)]
    pub scraping_available: bool,
}

/// Stats endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScraperStats {
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub total_categories: u64,
    #[serde(default)]
    pub total_jobs: u64,
    #[serde(default)]
    pub successful_jobs: u64,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// One page of scrape results.
///
/// The API serves either a bare array or a `{results, total}`
/// envelope; both shapes land here.
#[derive(Debug, Clone, Default)]
pub struct ResultsPage {
    pub results: Vec<Value>,
    pub total: u64,
}

impl ResultsPage {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self {
                results: items.clone(),
                total: items.len() as u64,
            },
            Value::Object(map) => {
                let results = map
                    .get("results")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                let total = map
                    .get("total")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(results.len() as u64);
                Self { results, total }
            }
            _ => Self::default(),
        }
    }
}

/// Query for the results endpoint.
#[derive(Debug, Clone, Default)]
pub struct ResultQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ResultQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

/// Query for the search endpoint.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: String,
    pub category: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(q: &str) -> Self {
        Self {
            q: q.to_string(),
            category: None,
            page: 1,
            limit: 20,
        }
    }

    pub(crate) fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scrape_config_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.max_items, 100);
        assert!(config.include_media);
    }

    #[test]
    fn test_quick_scrape_body() {
        let body = serde_json::to_value(ScrapeConfig::quick()).unwrap();
        assert_eq!(
            body,
            json!({
                "max_items": 100,
                "include_media": false,
                "include_documents": false,
                "include_metadata": true,
            })
        );
    }

    #[test]
    fn test_results_page_from_array() {
        let page = ResultsPage::from_value(&json!([{"id": 1}, {"id": 2}]));
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_results_page_from_envelope() {
        let page = ResultsPage::from_value(&json!({"results": [{"id": 1}], "total": 40}));
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.total, 40);
    }

    #[test]
    fn test_health_state_parse() {
        let report: HealthReport =
            serde_json::from_value(json!({"status": "degraded", "message": "slow"})).unwrap();
        assert_eq!(report.status, HealthState::Degraded);
    }
}
