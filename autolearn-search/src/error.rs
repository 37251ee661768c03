//! Error types for the autolearn-search crate.
//!
//! Messages are stable strings. API keys never appear in error text.

/// Errors that can occur while querying a search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The provider did not answer within the configured timeout.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider was rate limiting us (HTTP 429 or an equivalent page).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The provider needs credentials that are not configured.
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl SearchError {
    /// Map a reqwest error onto the matching variant, tagged with the provider name.
    ///
    /// The request URL is stripped first: query strings may carry API keys.
    pub(crate) fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(format!("{provider} request timed out"));
        }
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            return Self::RateLimited(format!("{provider} returned 429"));
        }
        let err = err.without_url();
        match std::error::Error::source(&err) {
            Some(cause) => Self::Http(format!("{provider} request failed: {err}: {cause}")),
            None => Self::Http(format!("{provider} request failed: {err}")),
        }
    }
}

/// Convenience type alias for autolearn-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
