//! # autolearn-search
//!
//! Search provider clients used by the autolearn learning loop.
//!
//! Two providers are supported:
//!
//! - DuckDuckGo, scraped from its HTML-only endpoint. No key required.
//! - Google Programmable Search through the Custom Search JSON API. Needs an
//!   API key and a search engine id.
//!
//! [`fetch_page`] downloads the page behind a hit and extracts its readable
//! text, for callers that want more than the snippet.
//!
//! Both clients bound every request by [`SearchConfig::timeout_seconds`] and
//! return at most [`SearchConfig::max_results`] hits. Choosing between
//! providers, merging and fallback are left to the caller.
//!
//! ## Security
//!
//! - API keys never appear in error messages
//! - Search queries are logged only at trace level

pub mod config;
pub mod content;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod types;

pub use config::SearchConfig;
pub use content::{fetch_page, PageContent};
pub use engine::SearchEngineTrait;
pub use engines::{DuckDuckGoEngine, GoogleEngine};
pub use error::{Result, SearchError};
pub use types::{SearchEngine, SearchResult};

/// Query a single provider.
///
/// Validates `config`, then dispatches to the client for `engine`.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for an invalid configuration, or whatever
/// the provider client reports.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> autolearn_search::Result<()> {
/// use autolearn_search::{search_with, SearchConfig, SearchEngine};
///
/// let config = SearchConfig::default();
/// let hits = search_with(SearchEngine::DuckDuckGo, "rust programming", &config).await?;
/// for hit in &hits {
///     println!("{}: {}", hit.title, hit.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_with(
    engine: SearchEngine,
    query: &str,
    config: &SearchConfig,
) -> Result<Vec<SearchResult>> {
    config.validate()?;
    match engine {
        SearchEngine::DuckDuckGo => DuckDuckGoEngine.search(query, config).await,
        SearchEngine::Google => GoogleEngine.search(query, config).await,
    }
}
