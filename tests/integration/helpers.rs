//! Shared helpers for integration tests.

use async_trait::async_trait;
use autolearn::LearningService;
use autolearn::aggregator::SearchAggregator;
use autolearn::config::{LearnConfig, SummarizerBackend};
use autolearn::cycle::CycleRunner;
use autolearn::degraded::DegradedCounters;
use autolearn::learn::Learner;
use autolearn::paths;
use autolearn::provider::{ProviderHit, SearchProvider};
use autolearn::queue::TaskQueue;
use autolearn::state::StateFile;
use autolearn::store::{JsonlStore, RecordStore};
use autolearn::summarize::LocalSummarizer;
use autolearn_search::SearchError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Provider stub returning `hits` results per query, or failing.
pub(crate) struct StubProvider {
    name: &'static str,
    hits: usize,
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl StubProvider {
    pub(crate) fn ok(name: &'static str, hits: usize) -> Arc<Self> {
        Arc::new(Self {
            name,
            hits,
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// Like [`StubProvider::ok`], but every query takes `delay`.
    pub(crate) fn slow(name: &'static str, hits: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            hits,
            fail: false,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            hits: 0,
            fail: true,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn query(&self, text: &str, max_results: usize) -> Result<Vec<ProviderHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(SearchError::Timeout(format!("{} timed out", self.name)));
        }
        Ok((0..self.hits.min(max_results))
            .map(|i| ProviderHit {
                title: format!("{text} {} #{i}", self.name),
                url: format!("https://{}.example/{i}", self.name),
                snippet: format!("snippet {i} for {text}"),
            })
            .collect())
    }
}

/// Config rooted at `dir` with the local summarizer and no topic delay.
pub(crate) fn test_config(dir: &Path, topics: &[&str]) -> LearnConfig {
    let mut config = LearnConfig::default();
    config.storage.data_dir = Some(dir.to_path_buf());
    config.summarizer.backend = SummarizerBackend::Local;
    config.cycle.topic_delay_ms = 0;
    config.topics = topics.iter().map(|t| (*t).to_owned()).collect();
    config
}

/// Build a service over a JSONL store in `dir` with injected providers.
pub(crate) fn service_with(
    dir: &Path,
    topics: &[&str],
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
) -> Arc<LearningService> {
    let config = test_config(dir, topics);
    let counters = Arc::new(DegradedCounters::new());
    let store: Arc<dyn RecordStore> = Arc::new(JsonlStore::open(paths::learned_file(dir)));
    let aggregator = Arc::new(SearchAggregator::new(
        primary,
        secondary,
        Arc::clone(&counters),
    ));
    let learner = Learner::new(
        aggregator,
        Arc::new(LocalSummarizer::default()),
        store,
        Arc::clone(&counters),
    );
    let queue = TaskQueue::new().with_counters(counters);
    let runner = CycleRunner::new(Arc::new(learner), Arc::new(queue), config.effective_topics())
        .with_topic_delay(Duration::ZERO)
        .with_state_file(StateFile::new(paths::state_file(dir)));
    Arc::new(LearningService::from_parts(
        config,
        dir.to_path_buf(),
        Arc::new(runner),
    ))
}

/// Service whose primary always answers with three hits.
pub(crate) fn simple_service(dir: &Path, topics: &[&str]) -> Arc<LearningService> {
    service_with(
        dir,
        topics,
        StubProvider::ok("primary", 3),
        StubProvider::ok("secondary", 3),
    )
}

/// Number of records currently in the store under `dir`.
pub(crate) fn record_count(dir: &Path) -> usize {
    JsonlStore::open(paths::learned_file(dir)).count().unwrap()
}
