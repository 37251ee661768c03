//! Learn-once: search, summarize, persist.
//!
//! [`Learner::learn`] always yields a record. Summarizer failures fall back to
//! the local digest and store failures are counted and logged, so a single
//! bad item never reaches the cycle runner as an error. When every provider
//! asked fails, the record is an error entry carrying the provider errors.
//!
//! With a [`PageReader`] attached, the pages behind the top hits are fetched
//! and summarized in place of their snippets. A page that cannot be read
//! falls back to its snippet.

use crate::aggregator::SearchAggregator;
use crate::degraded::{DegradedCounters, FailureClass};
use crate::provider::PageReader;
use crate::store::RecordStore;
use crate::summarize::{LocalSummarizer, Summarizer};
use crate::types::{LearnedRecord, RecordOrigin, SearchPreference, SearchResult};
use std::sync::Arc;

/// Composes the aggregator, a summarizer and the result store.
pub struct Learner {
    aggregator: Arc<SearchAggregator>,
    summarizer: Arc<dyn Summarizer>,
    fallback: LocalSummarizer,
    store: Arc<dyn RecordStore>,
    counters: Arc<DegradedCounters>,
    max_results: usize,
    pages: Option<Arc<dyn PageReader>>,
    fetch_pages: usize,
}

impl Learner {
    pub fn new(
        aggregator: Arc<SearchAggregator>,
        summarizer: Arc<dyn Summarizer>,
        store: Arc<dyn RecordStore>,
        counters: Arc<DegradedCounters>,
    ) -> Self {
        Self {
            aggregator,
            summarizer,
            fallback: LocalSummarizer::default(),
            store,
            counters,
            max_results: 8,
            pages: None,
            fetch_pages: 0,
        }
    }

    /// Cap on hits per learn.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Local digest used when the summarizer fails.
    pub fn with_fallback(mut self, fallback: LocalSummarizer) -> Self {
        self.fallback = fallback;
        self
    }

    /// Read the pages behind the first `top_n` hits before summarizing.
    pub fn with_page_reader(mut self, reader: Arc<dyn PageReader>, top_n: usize) -> Self {
        self.pages = Some(reader);
        self.fetch_pages = top_n;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn counters(&self) -> &Arc<DegradedCounters> {
        &self.counters
    }

    /// Learn `query` and persist the resulting record.
    ///
    /// A blank query yields an unpersisted error entry.
    pub async fn learn(
        &self,
        query: &str,
        preference: SearchPreference,
        origin: RecordOrigin,
    ) -> LearnedRecord {
        let query = query.trim();
        if query.is_empty() {
            self.counters
                .record(FailureClass::InvalidInput, "blank query reached learn");
            return LearnedRecord::error_entry(query, origin, preference, "empty query");
        }

        let outcome = self
            .aggregator
            .search_detailed(query, preference, self.max_results)
            .await;

        let record = if outcome.all_failed() {
            let error = format!("all providers failed: {}", outcome.provider_errors.join("; "));
            LearnedRecord::error_entry(query, origin, preference, error)
        } else if outcome.results.is_empty() {
            let summary = format!("No results found for \"{query}\".");
            LearnedRecord::new(query, summary, outcome.results, origin, preference)
        } else {
            let summary = self.summarize(query, &outcome.results).await;
            LearnedRecord::new(query, summary, outcome.results, origin, preference)
        };

        self.persist(&record).await;
        tracing::debug!(query, hits = record.results.len(), origin = ?origin, "learned");
        record
    }

    /// Append `record` to the store off the async executor. Failures are
    /// counted, never returned.
    pub async fn persist(&self, record: &LearnedRecord) {
        let store = Arc::clone(&self.store);
        let owned = record.clone();
        let outcome = tokio::task::spawn_blocking(move || store.append(&owned)).await;

        let detail = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e.to_string(),
            Err(join) => format!("store task failed: {join}"),
        };
        self.counters.record(
            FailureClass::Persistence,
            &format!("record for {:?} not persisted: {detail}", record.query),
        );
    }

    async fn summarize(&self, query: &str, results: &[SearchResult]) -> String {
        let texts = self.source_texts(results).await;

        let error = match self.summarizer.summarize(query, &texts).await {
            Ok(summary) if !summary.trim().is_empty() => return summary,
            Ok(_) => format!("{} summarizer returned an empty summary", self.summarizer.name()),
            Err(e) => e.to_string(),
        };

        self.counters.record(FailureClass::Summarization, &error);
        format!(
            "Simple digest (summarizer fallback):\n{}\n\n[summarizer error: {error}]",
            self.fallback.digest(&texts)
        )
    }

    /// One text per hit: the fetched page for the first `fetch_pages` hits
    /// when a reader is attached, the title and snippet otherwise.
    async fn source_texts(&self, results: &[SearchResult]) -> Vec<String> {
        let mut texts = Vec::with_capacity(results.len());
        for (i, result) in results.iter().enumerate() {
            let page = match &self.pages {
                Some(reader) if i < self.fetch_pages && !result.url.is_empty() => {
                    self.read_page(reader.as_ref(), result).await
                }
                _ => None,
            };
            texts.push(page.unwrap_or_else(|| result_text(result)));
        }
        texts
    }

    async fn read_page(&self, reader: &dyn PageReader, result: &SearchResult) -> Option<String> {
        match reader.read(&result.url).await {
            Ok(text) if !text.trim().is_empty() => match result.title.trim() {
                "" => Some(text),
                title => Some(format!("{title}\n{text}")),
            },
            Ok(_) => None,
            Err(e) => {
                self.counters.record(
                    FailureClass::TransientProvider,
                    &format!("page {} not read, using snippet: {e}", result.url),
                );
                None
            }
        }
    }
}

fn result_text(result: &SearchResult) -> String {
    match (result.title.trim(), result.snippet.trim()) {
        (title, "") => title.to_owned(),
        ("", snippet) => snippet.to_owned(),
        (title, snippet) => format!("{title}\n{snippet}"),
    }
}
