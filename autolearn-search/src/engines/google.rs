//! Google Programmable Search via the Custom Search JSON API.
//!
//! Requires an API key and a search engine id (`cx`). Without both the
//! engine refuses to issue a request and reports
//! [`SearchError::NotConfigured`].

use crate::config::SearchConfig;
use crate::engine::SearchEngineTrait;
use crate::error::SearchError;
use crate::http;
use crate::types::{SearchEngine, SearchResult};
use serde::Deserialize;

/// The API rejects `num` above this.
const MAX_NUM: usize = 10;

/// Google Custom Search JSON API client.
pub struct GoogleEngine;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl SearchEngineTrait for GoogleEngine {
    async fn search(
        &self,
        query: &str,
        config: &SearchConfig,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let Some((key, cx)) = config.google_credentials() else {
            return Err(SearchError::NotConfigured(
                "Google API key or search engine id missing".into(),
            ));
        };

        tracing::trace!(query, "Google CSE search");

        let client = http::build_client(config)?;
        let num = config.max_results.clamp(1, MAX_NUM).to_string();
        let mut params = vec![("key", key), ("cx", cx), ("q", query), ("num", num.as_str())];
        if config.safe_search {
            params.push(("safe", "active"));
        }

        let response = client
            .get(&config.google_endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest("Google", e))?;

        // Status errors are built by hand so the keyed URL never reaches the text.
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited("Google returned 429".into()));
        }
        if !status.is_success() {
            return Err(SearchError::Http(format!("Google returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|_| SearchError::Http("Google response read failed".into()))?;

        parse_cse_json(&body, config.max_results)
    }

    fn engine_type(&self) -> SearchEngine {
        SearchEngine::Google
    }
}

/// Parse a Custom Search JSON response. A body without `items` is an empty
/// result set.
pub(crate) fn parse_cse_json(
    body: &str,
    max_results: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: CseResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("Google response is not valid JSON: {e}")))?;

    let results: Vec<SearchResult> = parsed
        .items
        .into_iter()
        .filter(|item| !item.link.is_empty())
        .take(max_results)
        .map(|item| SearchResult {
            title: item.title,
            url: item.link,
            snippet: item.snippet,
            engine: SearchEngine::Google,
        })
        .collect();

    tracing::debug!(count = results.len(), "Google results parsed");
    Ok(results)
}
