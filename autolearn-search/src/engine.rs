//! Trait definition for pluggable search engine backends.

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::{SearchEngine, SearchResult};

/// A pluggable search engine backend.
///
/// Each engine handles its own URL construction, request headers and
/// response parsing. Implementations must be `Send + Sync` so one instance
/// can be shared across the scheduler and request handlers.
pub trait SearchEngineTrait: Send + Sync {
    /// Perform a search and return parsed hits, at most `config.max_results`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the request fails, times out, is rate
    /// limited, or the response cannot be parsed.
    fn search(
        &self,
        query: &str,
        config: &SearchConfig,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, SearchError>> + Send;

    /// Returns which [`SearchEngine`] variant this implementation represents.
    fn engine_type(&self) -> SearchEngine;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockEngine {
        engine: SearchEngine,
        results: Vec<SearchResult>,
    }

    impl SearchEngineTrait for MockEngine {
        async fn search(
            &self,
            _query: &str,
            config: &SearchConfig,
        ) -> Result<Vec<SearchResult>, SearchError> {
            if self.results.is_empty() {
                return Err(SearchError::Parse("mock engine failure".into()));
            }
            Ok(self
                .results
                .iter()
                .take(config.max_results)
                .cloned()
                .collect())
        }

        fn engine_type(&self) -> SearchEngine {
            self.engine
        }
    }

    fn hit(n: usize) -> SearchResult {
        SearchResult {
            title: format!("Hit {n}"),
            url: format!("https://example.com/{n}"),
            snippet: String::new(),
            engine: SearchEngine::DuckDuckGo,
        }
    }

    #[tokio::test]
    async fn mock_engine_respects_max_results() {
        let engine = MockEngine {
            engine: SearchEngine::DuckDuckGo,
            results: (0..5).map(hit).collect(),
        };
        let config = SearchConfig {
            max_results: 3,
            ..Default::default()
        };
        let results = engine.search("q", &config).await.expect("should succeed");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Hit 0");
    }

    #[tokio::test]
    async fn mock_engine_propagates_errors() {
        let engine = MockEngine {
            engine: SearchEngine::Google,
            results: vec![],
        };
        let err = engine
            .search("q", &SearchConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mock engine failure"));
        assert_eq!(engine.engine_type(), SearchEngine::Google);
    }
}
