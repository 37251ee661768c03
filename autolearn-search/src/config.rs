//! Provider configuration with sensible defaults.
//!
//! [`SearchConfig`] controls timeouts, result limits, request headers and
//! provider credentials. Endpoints are overridable so tests can point the
//! clients at a local mock server.

use crate::error::SearchError;

/// Default DuckDuckGo HTML endpoint.
pub const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Default Google Custom Search JSON API endpoint.
pub const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Configuration shared by all provider clients.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of hits a single provider call may return.
    pub max_results: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to request safe search filtering where supported.
    pub safe_search: bool,
    /// Region hint (DuckDuckGo `kl`, e.g. `"xa-ar"`, `"wt-wt"`). `None` lets
    /// the provider decide.
    pub region: Option<String>,
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Google API key for the Custom Search JSON API.
    pub google_api_key: Option<String>,
    /// Google Programmable Search engine id (`cx`).
    pub google_cse_id: Option<String>,
    /// DuckDuckGo HTML endpoint.
    pub duckduckgo_endpoint: String,
    /// Google Custom Search endpoint.
    pub google_endpoint: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 8,
            timeout_seconds: 20,
            safe_search: true,
            region: None,
            user_agent: None,
            google_api_key: None,
            google_cse_id: None,
            duckduckgo_endpoint: DUCKDUCKGO_ENDPOINT.to_owned(),
            google_endpoint: GOOGLE_ENDPOINT.to_owned(),
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Returns `(api_key, cse_id)` when both Google credentials are present
    /// and non-blank.
    pub fn google_credentials(&self) -> Option<(&str, &str)> {
        let key = self.google_api_key.as_deref().map(str::trim)?;
        let cx = self.google_cse_id.as_deref().map(str::trim)?;
        if key.is_empty() || cx.is_empty() {
            return None;
        }
        Some((key, cx))
    }
}
