//! Summarization backends.
//!
//! [`LocalSummarizer`] builds an extractive digest without any network and is
//! always available as the fallback. [`ApiSummarizer`] calls an
//! OpenAI-compatible `/v1/chat/completions` endpoint.

use crate::config::{SummarizerBackend, SummarizerConfig};
use crate::error::{LearnError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Width each text is shortened to in the local digest.
const ITEM_WIDTH: usize = 600;

/// Texts forwarded to the model at most.
const API_MAX_CHUNKS: usize = 5;

/// Turns a topic and its source texts into a summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Summarize `texts` gathered for `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Summarize`] when the backend fails.
    async fn summarize(&self, topic: &str, texts: &[String]) -> Result<String>;
}

/// Extractive digest: each text flattened and shortened, joined by blank
/// lines and capped at `max_chars`.
#[derive(Debug, Clone)]
pub struct LocalSummarizer {
    max_chars: usize,
}

impl LocalSummarizer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// The digest body without a heading.
    pub fn digest(&self, texts: &[String]) -> String {
        let joined = texts
            .iter()
            .map(|t| shorten(t, ITEM_WIDTH, "..."))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        truncate_chars(&joined, self.max_chars)
    }
}

impl Default for LocalSummarizer {
    fn default() -> Self {
        Self::new(SummarizerConfig::default().max_chars)
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    fn name(&self) -> &str {
        "local"
    }

    async fn summarize(&self, _topic: &str, texts: &[String]) -> Result<String> {
        Ok(format!("Quick digest (local):\n{}", self.digest(texts)))
    }
}

/// OpenAI-compatible chat completions client.
pub struct ApiSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ApiSummarizer {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()
            .map_err(|e| LearnError::Config(format!("cannot build summarizer client: {e}")))?;

        let base = config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        Ok(Self {
            client,
            endpoint: format!("{base}/v1/chat/completions"),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    fn build_body(&self, topic: &str, texts: &[String]) -> serde_json::Value {
        let mut prompt = format!(
            "Topic: {topic}\n\nSummarize the most important points briefly (5-8 points), \
             then close with a short 'Bottom line' paragraph."
        );
        prompt.push_str("\n\nTexts:\n");
        prompt.push_str(
            &texts
                .iter()
                .take(API_MAX_CHUNKS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n\n---\n\n"),
        );

        serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "Summarize the content concisely with numbered points and cite sources when available."
                },
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.2,
            "max_tokens": 600,
        })
    }
}

#[async_trait]
impl Summarizer for ApiSummarizer {
    fn name(&self) -> &str {
        "api"
    }

    async fn summarize(&self, topic: &str, texts: &[String]) -> Result<String> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&self.build_body(topic, texts));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LearnError::Summarize("summarizer request timed out".into())
            } else {
                LearnError::Summarize(format!("summarizer request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LearnError::Summarize(format!(
                "summarizer returned HTTP {status}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LearnError::Summarize(format!("invalid summarizer response: {e}")))?;

        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LearnError::Summarize(
                "summarizer returned no content".into(),
            ));
        }
        Ok(content.to_owned())
    }
}

/// Build the summarizer selected by `config`.
///
/// # Errors
///
/// Returns an error if the API client cannot be constructed.
pub fn from_config(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>> {
    Ok(match config.backend {
        SummarizerBackend::Local => Arc::new(LocalSummarizer::new(config.max_chars)),
        SummarizerBackend::Api => Arc::new(ApiSummarizer::new(config)?),
    })
}

/// Collapse whitespace and cut at a word boundary so the result, including
/// `placeholder`, fits in `width` characters.
pub fn shorten(text: &str, width: usize, placeholder: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(placeholder.chars().count());
    let mut out = String::new();
    let mut used = 0;
    for word in words {
        let extra = word.chars().count() + usize::from(!out.is_empty());
        if used + extra > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
        used += extra;
    }
    out.push_str(placeholder);
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_owned(),
        None => text.to_owned(),
    }
}
