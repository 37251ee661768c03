//! One learning cycle: drain the queue, then walk the topic list.
//!
//! Cycles are mutually exclusive. A scheduled cycle and an on-demand one
//! never run at the same time; the later caller waits for the earlier to
//! finish and then drains whatever has been queued since.

use crate::config::normalize_topics;
use crate::degraded::{DegradedCounters, FailureClass};
use crate::learn::Learner;
use crate::queue::TaskQueue;
use crate::state::{LearnState, StateFile};
use crate::types::{CycleReport, LearnedRecord, RecordOrigin, SearchPreference};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Runs cycles against a queue, a topic list and a learner.
pub struct CycleRunner {
    learner: Arc<Learner>,
    queue: Arc<TaskQueue>,
    topics: Vec<String>,
    preference: SearchPreference,
    topic_delay: Duration,
    cycle_lock: tokio::sync::Mutex<()>,
    in_progress: AtomicBool,
    state: Arc<Mutex<LearnState>>,
    state_file: Option<StateFile>,
    save_lock: Arc<Mutex<()>>,
}

impl CycleRunner {
    pub fn new(learner: Arc<Learner>, queue: Arc<TaskQueue>, topics: Vec<String>) -> Self {
        Self {
            learner,
            queue,
            topics: normalize_topics(&topics),
            preference: SearchPreference::Auto,
            topic_delay: Duration::from_millis(1500),
            cycle_lock: tokio::sync::Mutex::new(()),
            in_progress: AtomicBool::new(false),
            state: Arc::new(Mutex::new(LearnState::default())),
            state_file: None,
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_preference(mut self, preference: SearchPreference) -> Self {
        self.preference = preference;
        self
    }

    /// Pause between consecutive topic lookups.
    pub fn with_topic_delay(mut self, delay: Duration) -> Self {
        self.topic_delay = delay;
        self
    }

    /// Persist run counters to `file`, seeding them from its current contents.
    pub fn with_state_file(mut self, file: StateFile) -> Self {
        self.state = Arc::new(Mutex::new(file.load_or_default()));
        self.state_file = Some(file);
        self
    }

    pub fn queue(&self) -> &Arc<TaskQueue> {
        &self.queue
    }

    pub fn learner(&self) -> &Arc<Learner> {
        &self.learner
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn preference(&self) -> SearchPreference {
        self.preference
    }

    /// Whether a cycle is executing right now.
    pub fn is_running_cycle(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Copy of the persisted run counters.
    pub fn state(&self) -> LearnState {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Record the scheduler interval in the state file.
    ///
    /// Inside a runtime the write is handed to the blocking pool and not
    /// awaited; outside one it happens inline.
    pub fn note_interval(&self, interval_secs: u64) {
        self.apply_state(|s| s.interval_secs = interval_secs);
        let Some(save) = self.state_saver() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(save);
            }
            Err(_) => save(),
        }
    }

    /// Run one full cycle.
    ///
    /// Uses `extra_topics` instead of the configured topics when it holds at
    /// least one non-blank entry. Never fails: every item produces a record
    /// and failed items are counted in the report.
    pub async fn run_cycle(&self, extra_topics: Option<&[String]>) -> CycleReport {
        let _cycle = self.cycle_lock.lock().await;
        let _flag = InProgress::set(&self.in_progress);

        let started_at = Utc::now();
        let mut report = CycleReport {
            started_at: Some(started_at),
            ..Default::default()
        };

        let tasks = self.queue.drain_all();
        tracing::info!(queued = tasks.len(), "cycle started");

        for task in tasks {
            if !self.learn_item(&task.query, RecordOrigin::Queue).await {
                report.failures += 1;
            }
            report.queue_processed += 1;
        }

        let extra = extra_topics.map(normalize_topics).unwrap_or_default();
        let topics = if extra.is_empty() { &self.topics } else { &extra };

        for (index, topic) in topics.iter().enumerate() {
            if index > 0 && !self.topic_delay.is_zero() {
                tokio::time::sleep(self.topic_delay).await;
            }
            if !self.learn_item(topic, RecordOrigin::Topic).await {
                report.failures += 1;
            }
            report.topics_processed += 1;
        }

        let finished_at = Utc::now();
        report.finished_at = Some(finished_at);
        report.summary_message = format!(
            "processed {} queued task(s) and {} topic(s), {} failed, in {:.1}s",
            report.queue_processed,
            report.topics_processed,
            report.failures,
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0
        );
        tracing::info!(
            queue_processed = report.queue_processed,
            topics_processed = report.topics_processed,
            failures = report.failures,
            "cycle finished"
        );

        self.update_state(|s| s.record_cycle(&report)).await;
        report
    }

    /// Learn one item in its own task so a panic is contained to the item.
    /// Returns `false` when the item ended as an error entry.
    async fn learn_item(&self, query: &str, origin: RecordOrigin) -> bool {
        let learner = Arc::clone(&self.learner);
        let owned = query.to_owned();
        let preference = self.preference;
        let handle =
            tokio::spawn(async move { learner.learn(&owned, preference, origin).await });

        match handle.await {
            Ok(record) => !record.is_error(),
            Err(join) => {
                let reason = if join.is_panic() {
                    "learn task panicked"
                } else {
                    "learn task cancelled"
                };
                self.counters()
                    .record(FailureClass::ItemPanicked, &format!("{reason} for {query:?}"));
                let entry = LearnedRecord::error_entry(query, origin, preference, reason);
                self.learner.persist(&entry).await;
                false
            }
        }
    }

    fn counters(&self) -> &Arc<DegradedCounters> {
        self.learner.counters()
    }

    fn apply_state(&self, apply: impl FnOnce(&mut LearnState)) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        apply(&mut state);
    }

    /// Apply `apply` in memory, then write the state file on the blocking
    /// pool and wait for it.
    async fn update_state(&self, apply: impl FnOnce(&mut LearnState)) {
        self.apply_state(apply);
        if let Some(save) = self.state_saver()
            && let Err(e) = tokio::task::spawn_blocking(save).await
        {
            self.counters()
                .record(FailureClass::Persistence, &format!("state save task failed: {e}"));
        }
    }

    /// A job writing the latest in-memory state to the state file, if any.
    ///
    /// Saves are serialized and each one snapshots the state when it runs,
    /// so the file never goes back to an older state.
    fn state_saver(&self) -> Option<impl FnOnce() + Send + 'static> {
        let file = self.state_file.clone()?;
        let state = Arc::clone(&self.state);
        let save_lock = Arc::clone(&self.save_lock);
        let counters = Arc::clone(self.counters());
        Some(move || {
            let _save = save_lock.lock().unwrap_or_else(|p| p.into_inner());
            let snapshot = state.lock().unwrap_or_else(|p| p.into_inner()).clone();
            if let Err(e) = file.save(&snapshot) {
                counters.record(FailureClass::Persistence, &format!("state not saved: {e}"));
            }
        })
    }
}

/// Clears the in-progress flag on drop, including on panic or cancellation.
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
