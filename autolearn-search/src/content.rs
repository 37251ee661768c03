//! Readable text from a result page.
//!
//! Snippets are short, so the learner may fetch the page behind a hit and
//! summarize its body instead. [`fetch_page`] downloads one page with the
//! shared client; [`extract_page`] reduces the HTML to plain text with script,
//! style and layout chrome removed.

use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::http;
use scraper::{ElementRef, Html, Node, Selector};

/// Default cap on extracted text, in characters.
pub const DEFAULT_MAX_CHARS: usize = 20_000;

/// Elements whose text never counts as page content.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "nav", "header", "footer",
    "aside",
];

/// Content containers, tried in order. The first one holding text wins.
const CONTENT_SELECTORS: &[&str] = &["article", "main", "[role=\"main\"]", "body"];

/// Text extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: String,
    /// Contents of `<title>`, empty when absent.
    pub title: String,
    /// Whitespace-normalised body text.
    pub text: String,
    /// Whether `text` was cut at the character cap.
    pub truncated: bool,
}

/// Fetch `url` and extract at most `max_chars` characters of text.
///
/// The request is bounded by [`SearchConfig::timeout_seconds`] like every
/// provider call. Only `http` and `https` URLs are fetched.
///
/// # Errors
///
/// [`SearchError::Config`] for an invalid configuration or URL scheme,
/// [`SearchError::Http`], [`SearchError::Timeout`] or
/// [`SearchError::RateLimited`] for transport failures and non-2xx statuses,
/// and [`SearchError::Parse`] when the page has no extractable text.
pub async fn fetch_page(
    url: &str,
    config: &SearchConfig,
    max_chars: usize,
) -> Result<PageContent> {
    config.validate()?;
    let parsed = url::Url::parse(url)
        .map_err(|e| SearchError::Config(format!("invalid page URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SearchError::Config(format!(
            "unsupported page URL scheme: {}",
            parsed.scheme()
        )));
    }

    tracing::trace!(url, "fetching page");
    let client = http::build_client(config)?;
    let body = client
        .get(parsed)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| SearchError::from_reqwest("page", e))?
        .text()
        .await
        .map_err(|e| SearchError::from_reqwest("page", e))?;

    extract_page(&body, url, max_chars)
}

/// Extract readable text from an HTML document.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no text survives extraction.
pub fn extract_page(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);
    let text = main_text(&document);
    if text.is_empty() {
        return Err(SearchError::Parse("no extractable content found".into()));
    }
    let (text, truncated) = truncate_chars(&text, max_chars);

    Ok(PageContent {
        url: url.to_owned(),
        title: title(&document),
        text,
        truncated,
    })
}

fn title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_owned())
        .unwrap_or_default()
}

fn main_text(document: &Html) -> String {
    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = visible_text(element);
            if !text.is_empty() {
                return text;
            }
        }
    }
    visible_text(document.root_element())
}

/// Text nodes under `element` that are not inside a skipped tag, joined by
/// single spaces.
fn visible_text(element: ElementRef<'_>) -> String {
    let root = element.id();
    let words: Vec<&str> = element
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let hidden = node
                .ancestors()
                .take_while(|a| a.id() != root)
                .any(|a| {
                    a.value()
                        .as_element()
                        .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
                });
            (!hidden).then_some(&**text)
        })
        .flat_map(str::split_whitespace)
        .collect();
    words.join(" ")
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (text[..cut].trim_end().to_owned(), true),
        None => (text.to_owned(), false),
    }
}
