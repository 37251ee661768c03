//! Degraded-mode accounting.
//!
//! Every place that swallows a failure classifies it and bumps a counter here
//! so operators can see the loop running degraded instead of guessing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Classes of failure contained inside the learning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Provider timeout, rate limit, HTTP or parse failure.
    TransientProvider,
    /// Summarizer backend failed; the local digest was used.
    Summarization,
    /// A record or state write failed.
    Persistence,
    /// Empty or whitespace-only input reached the core.
    InvalidInput,
    /// A learn task panicked and was replaced by an error entry.
    ItemPanicked,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientProvider => "transient_provider",
            Self::Summarization => "summarization",
            Self::Persistence => "persistence",
            Self::InvalidInput => "invalid_input",
            Self::ItemPanicked => "item_panicked",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free counters, one per [`FailureClass`].
#[derive(Debug, Default)]
pub struct DegradedCounters {
    transient_provider: AtomicU64,
    summarization: AtomicU64,
    persistence: AtomicU64,
    invalid_input: AtomicU64,
    item_panicked: AtomicU64,
}

impl DegradedCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one contained failure and log it.
    pub fn record(&self, class: FailureClass, detail: &str) {
        self.counter(class).fetch_add(1, Ordering::Relaxed);
        tracing::warn!(class = %class, detail, "contained failure");
    }

    pub fn get(&self, class: FailureClass) -> u64 {
        self.counter(class).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DegradedSnapshot {
        DegradedSnapshot {
            transient_provider: self.get(FailureClass::TransientProvider),
            summarization: self.get(FailureClass::Summarization),
            persistence: self.get(FailureClass::Persistence),
            invalid_input: self.get(FailureClass::InvalidInput),
            item_panicked: self.get(FailureClass::ItemPanicked),
        }
    }

    fn counter(&self, class: FailureClass) -> &AtomicU64 {
        match class {
            FailureClass::TransientProvider => &self.transient_provider,
            FailureClass::Summarization => &self.summarization,
            FailureClass::Persistence => &self.persistence,
            FailureClass::InvalidInput => &self.invalid_input,
            FailureClass::ItemPanicked => &self.item_panicked,
        }
    }
}

/// Serializable copy of [`DegradedCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedSnapshot {
    pub transient_provider: u64,
    pub summarization: u64,
    pub persistence: u64,
    pub invalid_input: u64,
    pub item_panicked: u64,
}

impl DegradedSnapshot {
    pub fn total(&self) -> u64 {
        self.transient_provider
            + self.summarization
            + self.persistence
            + self.invalid_input
            + self.item_panicked
    }
}
