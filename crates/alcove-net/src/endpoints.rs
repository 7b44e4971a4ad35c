//! Endpoint map
//!
//! Named API operations with per-name path overrides.

use std::collections::HashMap;

/// Named operation of the scraping API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Health,
    Trigger,
    Status,
    Results,
    Stats,
    Categories,
    Search,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Trigger => "trigger",
            Self::Status => "status",
            Self::Results => "results",
            Self::Stats => "stats",
            Self::Categories => "categories",
            Self::Search => "search",
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Health => "/health",
            Self::Trigger => "/trigger",
            Self::Status => "/status",
            Self::Results => "/results",
            Self::Stats => "/stats",
            Self::Categories => "/categories",
            Self::Search => "/search",
        }
    }
}

/// Endpoint-name → path map with per-entry overrides.
///
/// Overriding one endpoint never affects the defaults of the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointMap {
    overrides: HashMap<Endpoint, String>,
}

impl EndpointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective path for an endpoint.
    pub fn path(&self, endpoint: Endpoint) -> &str {
        self.overrides
            .get(&endpoint)
            .map(|s| s.as_str())
            .unwrap_or_else(|| endpoint.default_path())
    }

    /// Override the path of a single endpoint.
    pub fn set(&mut self, endpoint: Endpoint, path: &str) {
        self.overrides.insert(endpoint, path.to_string());
    }

    /// Builder-style override.
    pub fn with(mut self, endpoint: Endpoint, path: &str) -> Self {
        self.set(endpoint, path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let map = EndpointMap::new();
        assert_eq!(map.path(Endpoint::Health), "/health");
        assert_eq!(map.path(Endpoint::Search), "/search");
    }

    #[test]
    fn test_override_is_local() {
        let map = EndpointMap::new().with(Endpoint::Results, "/v2/results");
        assert_eq!(map.path(Endpoint::Results), "/v2/results");
        // The other endpoints keep their defaults.
        assert_eq!(map.path(Endpoint::Trigger), "/trigger");
    }
}
