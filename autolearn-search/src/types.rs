//! Core types for provider hits and engine identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hit returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The title of the result page.
    pub title: String,
    /// The URL of the result.
    pub url: String,
    /// A text snippet describing the page content. May be empty.
    pub snippet: String,
    /// Which engine produced this hit.
    pub engine: SearchEngine,
}

/// Search engines that autolearn-search can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchEngine {
    /// DuckDuckGo HTML endpoint. Keyless.
    #[serde(rename = "duckduckgo")]
    DuckDuckGo,
    /// Google Programmable Search (Custom Search JSON API). Needs an API key
    /// and a search engine id.
    #[serde(rename = "google")]
    Google,
}

impl SearchEngine {
    /// Returns the human-readable name of this engine.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Google => "Google",
        }
    }

    /// Returns all available engine variants.
    pub fn all() -> &'static [SearchEngine] {
        &[Self::DuckDuckGo, Self::Google]
    }

    /// Whether this engine can run without credentials.
    pub fn is_keyless(&self) -> bool {
        matches!(self, Self::DuckDuckGo)
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
