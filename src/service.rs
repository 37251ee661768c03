//! The learning service: the operations exposed to the gateway and the CLI.
//!
//! [`LearningService`] wires configuration into a queue, a result store, the
//! search aggregator, a summarizer, the cycle runner and the scheduler, and
//! owns them for the life of the process.

use crate::aggregator::SearchAggregator;
use crate::config::LearnConfig;
use crate::cycle::CycleRunner;
use crate::degraded::DegradedCounters;
use crate::error::{LearnError, Result};
use crate::learn::Learner;
use crate::paths;
use crate::provider::{EngineProvider, HttpPageReader};
use crate::queue::TaskQueue;
use crate::scheduler::LearningScheduler;
use crate::state::StateFile;
use crate::store::{JsonlStore, RecordStore};
use crate::summarize::{self, LocalSummarizer};
use crate::types::{CycleReport, LearnedRecord, RecordOrigin, SchedulerStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Facade over the learning loop.
pub struct LearningService {
    config: LearnConfig,
    data_dir: PathBuf,
    scheduler: LearningScheduler,
}

impl LearningService {
    /// Build the full service from configuration.
    ///
    /// Creates the data directory if missing. The scheduler is constructed
    /// stopped; see [`LearningService::scheduler_start`].
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created or the
    /// summarizer client cannot be built.
    pub fn from_config(config: &LearnConfig) -> Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)?;

        let counters = Arc::new(DegradedCounters::new());

        let mut queue = TaskQueue::new().with_counters(Arc::clone(&counters));
        if config.storage.audit_queue {
            queue = queue.with_audit_log(paths::queue_audit_file(&data_dir));
        }

        let store: Arc<dyn RecordStore> =
            Arc::new(JsonlStore::open(paths::learned_file(&data_dir)));

        let search_config = config.search.to_search_config();
        let aggregator = Arc::new(SearchAggregator::new(
            Arc::new(EngineProvider::new(
                config.search.primary,
                search_config.clone(),
            )),
            Arc::new(EngineProvider::new(config.search.secondary, search_config)),
            Arc::clone(&counters),
        ));

        let summarizer = summarize::from_config(&config.summarizer)?;
        let mut learner = Learner::new(aggregator, summarizer, store, counters)
            .with_max_results(config.search.max_results)
            .with_fallback(LocalSummarizer::new(config.summarizer.max_chars));
        if config.search.fetch_pages > 0 {
            let reader = HttpPageReader::new(
                config.search.to_page_config(),
                config.search.page_max_chars,
            );
            learner = learner.with_page_reader(Arc::new(reader), config.search.fetch_pages);
        }

        let runner = CycleRunner::new(
            Arc::new(learner),
            Arc::new(queue),
            config.effective_topics(),
        )
        .with_preference(config.search.preference)
        .with_topic_delay(Duration::from_millis(config.cycle.topic_delay_ms))
        .with_state_file(StateFile::new(paths::state_file(&data_dir)));

        info!(
            data_dir = %data_dir.display(),
            primary = %config.search.primary,
            secondary = %config.search.secondary,
            summarizer = ?config.summarizer.backend,
            fetch_pages = config.search.fetch_pages,
            topics = runner.topics().len(),
            "learning service ready"
        );

        Ok(Self::from_parts(config.clone(), data_dir, Arc::new(runner)))
    }

    /// Assemble a service around an already built runner.
    pub fn from_parts(config: LearnConfig, data_dir: PathBuf, runner: Arc<CycleRunner>) -> Self {
        let scheduler = LearningScheduler::new(runner, config.scheduler.interval_secs);
        Self {
            config,
            data_dir,
            scheduler,
        }
    }

    pub fn config(&self) -> &LearnConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn runner(&self) -> &Arc<CycleRunner> {
        self.scheduler.runner()
    }

    /// Queue a query for the next cycle. Blank input is ignored.
    pub fn enqueue(&self, query: &str) -> bool {
        self.runner().queue().enqueue(query)
    }

    /// Up to `limit` pending queries, newest first.
    pub fn queue_snapshot(&self, limit: usize) -> Vec<String> {
        self.runner().queue().peek_recent(limit)
    }

    /// Run a cycle now, waiting for any cycle already in progress.
    ///
    /// Non-blank `topics` replace the configured topic list for this run. The
    /// cycle runs on its own task: dropping the returned future stops the
    /// wait, not the cycle, so drained queue tasks are still learned.
    pub async fn run_cycle_now(&self, topics: Option<&[String]>) -> CycleReport {
        let runner = Arc::clone(self.runner());
        let topics = topics.map(<[String]>::to_vec);
        let cycle = tokio::spawn(async move { runner.run_cycle(topics.as_deref()).await });
        cycle.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "cycle task failed");
            CycleReport {
                summary_message: format!("cycle task failed: {e}"),
                ..Default::default()
            }
        })
    }

    /// Learn a single query immediately, outside the queue.
    pub async fn learn_now(&self, query: &str) -> LearnedRecord {
        let runner = self.runner();
        runner
            .learner()
            .learn(query, runner.preference(), RecordOrigin::Manual)
            .await
    }

    pub fn scheduler_status(&self) -> SchedulerStatus {
        self.scheduler.status()
    }

    /// Up to `limit` stored records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the result store cannot be read.
    pub async fn recent_results(&self, limit: usize) -> Result<Vec<LearnedRecord>> {
        let store = Arc::clone(self.runner().learner().store());
        tokio::task::spawn_blocking(move || store.recent(limit))
            .await
            .map_err(|e| LearnError::Store(format!("read task failed: {e}")))?
    }

    /// Start the scheduler. Missing arguments fall back to configuration.
    /// Returns `Ok(false)` if it was already running.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn scheduler_start(
        &self,
        interval_secs: Option<u64>,
        run_immediately: Option<bool>,
    ) -> Result<bool> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(LearnError::Scheduler(
                "scheduler needs a tokio runtime".to_owned(),
            ));
        }
        Ok(self.scheduler.start(
            interval_secs.unwrap_or(self.config.scheduler.interval_secs),
            run_immediately.unwrap_or(self.config.scheduler.run_immediately),
        ))
    }

    /// Stop the scheduler. Returns `false` if it was not running.
    pub fn scheduler_stop(&self) -> bool {
        self.scheduler.shutdown()
    }

    /// Stop the scheduler and wait for an in-flight cycle to finish.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown_and_wait().await;
    }
}
