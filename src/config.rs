//! Configuration types for the learning loop.
//!
//! Loaded from TOML with every section defaulted, then optionally overlaid
//! with environment variables (see [`LearnConfig::apply_env_overrides`]).

use crate::error::{LearnError, Result};
use crate::types::SearchPreference;
use autolearn_search::SearchEngine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnConfig {
    /// Periodic cycle timing.
    pub scheduler: SchedulerConfig,
    /// Static topics processed on every cycle. Read-only at runtime.
    pub topics: Vec<String>,
    /// Provider selection and request limits.
    pub search: SearchSettings,
    /// Summarizer backend.
    pub summarizer: SummarizerConfig,
    /// Per-cycle pacing.
    pub cycle: CycleConfig,
    /// On-disk artifacts.
    pub storage: StorageConfig,
    /// HTTP gateway.
    pub gateway: GatewayConfig,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            topics: default_topics(),
            search: SearchSettings::default(),
            summarizer: SummarizerConfig::default(),
            cycle: CycleConfig::default(),
            storage: StorageConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

fn default_topics() -> Vec<String> {
    [
        "latest artificial intelligence techniques",
        "modern programming frameworks",
        "computer networks and systems",
        "information security and cryptography",
        "open source software news",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between cycles.
    pub interval_secs: u64,
    /// Run one cycle as soon as the scheduler starts.
    pub run_immediately: bool,
    /// Start the scheduler when the server starts.
    pub autostart: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            run_immediately: true,
            autostart: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub preference: SearchPreference,
    /// Upper bound on hits per learn, across providers.
    pub max_results: usize,
    /// Per-provider request timeout.
    pub timeout_secs: u64,
    /// DuckDuckGo region code (`kl`), e.g. `xa-ar` or `wt-wt`.
    pub region: Option<String>,
    pub safe_search: bool,
    pub primary: SearchEngine,
    pub secondary: SearchEngine,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    /// How many top hits get their page fetched for the summary. `0` keeps
    /// snippets only.
    pub fetch_pages: usize,
    /// Per-page fetch timeout.
    pub page_timeout_secs: u64,
    /// Cap on text kept from one fetched page, in characters.
    pub page_max_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            preference: SearchPreference::Auto,
            max_results: 8,
            timeout_secs: 20,
            region: None,
            safe_search: true,
            primary: SearchEngine::DuckDuckGo,
            secondary: SearchEngine::Google,
            google_api_key: None,
            google_cse_id: None,
            fetch_pages: 3,
            page_timeout_secs: 15,
            page_max_chars: autolearn_search::content::DEFAULT_MAX_CHARS,
        }
    }
}

impl SearchSettings {
    /// Provider-level configuration for the search crate.
    pub fn to_search_config(&self) -> autolearn_search::SearchConfig {
        autolearn_search::SearchConfig {
            max_results: self.max_results,
            timeout_seconds: self.timeout_secs,
            safe_search: self.safe_search,
            region: self.region.clone(),
            google_api_key: self.google_api_key.clone(),
            google_cse_id: self.google_cse_id.clone(),
            ..Default::default()
        }
    }

    /// Configuration for page fetches: the search settings with the page
    /// timeout.
    pub fn to_page_config(&self) -> autolearn_search::SearchConfig {
        autolearn_search::SearchConfig {
            timeout_seconds: self.page_timeout_secs,
            ..self.to_search_config()
        }
    }
}

/// Which summarizer implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizerBackend {
    /// Extractive digest, no network.
    #[default]
    Local,
    /// OpenAI-compatible chat completions endpoint.
    Api,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub backend: SummarizerBackend,
    /// Base URL without the `/v1` suffix.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Cap on the local digest length, in characters.
    pub max_chars: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            backend: SummarizerBackend::Local,
            base_url: "https://api.openai.com".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key: None,
            timeout_secs: 30,
            max_chars: 1200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Courtesy delay between topic lookups, in milliseconds.
    pub topic_delay_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            topic_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides [`crate::paths::data_dir`].
    pub data_dir: Option<PathBuf>,
    /// Append every enqueued task to `queue_audit.jsonl`.
    pub audit_queue: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            audit_queue: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Shared token required as `Authorization: Bearer <token>` when set.
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
            bearer_token: None,
        }
    }
}

impl LearnConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LearnError::Config(e.to_string()))
    }

    /// Load `path` if it exists, else defaults. Environment overrides are
    /// applied and the result validated.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or the final
    /// configuration is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LearnError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config path: `<config_dir>/config.toml`.
    pub fn default_config_path() -> PathBuf {
        crate::paths::config_file()
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(crate::paths::data_dir)
    }

    /// Topics with surrounding whitespace removed and blanks dropped.
    pub fn effective_topics(&self) -> Vec<String> {
        normalize_topics(&self.topics)
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `LEARN_INTERVAL_MIN` | `scheduler.interval_secs` in minutes, at least 1 |
    /// | `OPENAI_API_KEY` | sets the key and switches the summarizer to `api` |
    /// | `OPENAI_MODEL` | `summarizer.model` |
    /// | `GOOGLE_API_KEY` / `GOOGLE_CSE_ID` | Google credentials |
    /// | `AUTOLEARN_TOKEN` | `gateway.bearer_token` |
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        if let Some(raw) = non_blank("LEARN_INTERVAL_MIN") {
            match raw.parse::<u64>() {
                Ok(minutes) => self.scheduler.interval_secs = minutes.max(1) * 60,
                Err(_) => tracing::warn!(value = %raw, "ignoring non-numeric LEARN_INTERVAL_MIN"),
            }
        }
        if let Some(key) = non_blank("OPENAI_API_KEY") {
            self.summarizer.api_key = Some(key);
            self.summarizer.backend = SummarizerBackend::Api;
        }
        if let Some(model) = non_blank("OPENAI_MODEL") {
            self.summarizer.model = model;
        }
        if let Some(key) = non_blank("GOOGLE_API_KEY") {
            self.search.google_api_key = Some(key);
        }
        if let Some(cx) = non_blank("GOOGLE_CSE_ID") {
            self.search.google_cse_id = Some(cx);
        }
        if let Some(token) = non_blank("AUTOLEARN_TOKEN") {
            self.gateway.bearer_token = Some(token);
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.interval_secs == 0 {
            return Err(LearnError::Config(
                "scheduler.interval_secs must be greater than 0".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(LearnError::Config(
                "search.max_results must be greater than 0".into(),
            ));
        }
        if self.search.timeout_secs == 0 {
            return Err(LearnError::Config(
                "search.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.search.fetch_pages > 0 && self.search.page_timeout_secs == 0 {
            return Err(LearnError::Config(
                "search.page_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.search.fetch_pages > 0 && self.search.page_max_chars == 0 {
            return Err(LearnError::Config(
                "search.page_max_chars must be greater than 0".into(),
            ));
        }
        if self.summarizer.timeout_secs == 0 {
            return Err(LearnError::Config(
                "summarizer.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.summarizer.max_chars == 0 {
            return Err(LearnError::Config(
                "summarizer.max_chars must be greater than 0".into(),
            ));
        }
        if self.summarizer.backend == SummarizerBackend::Api
            && self.summarizer.base_url.trim().is_empty()
        {
            return Err(LearnError::Config(
                "summarizer.base_url is required for the api backend".into(),
            ));
        }
        if self.gateway.host.trim().is_empty() {
            return Err(LearnError::Config("gateway.host must not be empty".into()));
        }
        Ok(())
    }
}

/// Trim topics and drop blank ones, keeping order.
pub fn normalize_topics(topics: &[String]) -> Vec<String> {
    topics
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}
