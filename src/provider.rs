//! Search capability consumed by the aggregator.
//!
//! The core only sees [`SearchProvider`] and [`PageReader`];
//! [`EngineProvider`] and [`HttpPageReader`] adapt the concrete clients from
//! `autolearn-search`, and tests inject stubs.

use async_trait::async_trait;
use autolearn_search::{SearchConfig, SearchEngine, SearchError};
use std::time::Duration;

/// A raw hit from a provider, before slot tagging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

impl From<autolearn_search::SearchResult> for ProviderHit {
    fn from(r: autolearn_search::SearchResult) -> Self {
        Self {
            title: r.title,
            url: r.url,
            snippet: r.snippet,
        }
    }
}

/// An external search capability.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return at most `max_results` hits for `text`.
    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<ProviderHit>, SearchError>;
}

/// Slack on top of the HTTP client timeout before the call is abandoned.
const TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// [`SearchProvider`] backed by an `autolearn-search` engine client.
pub struct EngineProvider {
    engine: SearchEngine,
    config: SearchConfig,
}

impl EngineProvider {
    pub fn new(engine: SearchEngine, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> SearchEngine {
        self.engine
    }
}

#[async_trait]
impl SearchProvider for EngineProvider {
    fn name(&self) -> &str {
        self.engine.name()
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<ProviderHit>, SearchError> {
        let config = SearchConfig {
            max_results: max_results.max(1),
            ..self.config.clone()
        };
        // The HTTP client enforces the timeout per request; this bounds the
        // whole call including body parsing.
        let budget = Duration::from_secs(config.timeout_seconds) + TIMEOUT_GRACE;
        let hits = tokio::time::timeout(
            budget,
            autolearn_search::search_with(self.engine, text, &config),
        )
        .await
        .map_err(|_| {
            SearchError::Timeout(format!("{} exceeded {}s", self.engine, budget.as_secs()))
        })??;

        Ok(hits.into_iter().take(max_results).map(ProviderHit::from).collect())
    }
}

/// Fetches the readable text behind a result URL.
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read(&self, url: &str) -> Result<String, SearchError>;
}

/// [`PageReader`] backed by [`autolearn_search::fetch_page`].
pub struct HttpPageReader {
    config: SearchConfig,
    max_chars: usize,
}

impl HttpPageReader {
    /// `config.timeout_seconds` bounds each fetch; text is cut at `max_chars`.
    pub fn new(config: SearchConfig, max_chars: usize) -> Self {
        Self { config, max_chars }
    }
}

#[async_trait]
impl PageReader for HttpPageReader {
    async fn read(&self, url: &str) -> Result<String, SearchError> {
        let budget = Duration::from_secs(self.config.timeout_seconds) + TIMEOUT_GRACE;
        let page = tokio::time::timeout(
            budget,
            autolearn_search::fetch_page(url, &self.config, self.max_chars),
        )
        .await
        .map_err(|_| SearchError::Timeout(format!("page fetch exceeded {}s", budget.as_secs())))??;
        Ok(page.text)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn engine_provider_maps_hits_and_caps_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {"title": "A", "link": "https://a.example", "snippet": "a"},
                    {"title": "B", "link": "https://b.example", "snippet": "b"},
                    {"title": "C", "link": "https://c.example", "snippet": "c"}
                ]
            })))
            .mount(&server)
            .await;

        let provider = EngineProvider::new(
            SearchEngine::Google,
            SearchConfig {
                google_endpoint: server.uri(),
                google_api_key: Some("k".into()),
                google_cse_id: Some("cx".into()),
                ..Default::default()
            },
        );
        let hits = provider.query("q", 2).await.unwrap();
        assert_eq!(provider.name(), "Google");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://a.example");
    }

    #[tokio::test]
    async fn engine_provider_surfaces_provider_errors() {
        let provider = EngineProvider::new(SearchEngine::Google, SearchConfig::default());
        let err = provider.query("q", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn http_page_reader_returns_capped_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><script>x()</script><p>alpha beta gamma delta</p></body></html>",
            ))
            .mount(&server)
            .await;

        let reader = HttpPageReader::new(SearchConfig::default(), 10);
        let text = reader.read(&format!("{}/page", server.uri())).await.unwrap();
        assert_eq!(text, "alpha beta");
    }

    #[tokio::test]
    async fn http_page_reader_reports_unreachable_pages() {
        let config = SearchConfig {
            timeout_seconds: 2,
            ..Default::default()
        };
        let reader = HttpPageReader::new(config, 100);
        assert!(reader.read("http://127.0.0.1:1/nothing").await.is_err());
    }
}
