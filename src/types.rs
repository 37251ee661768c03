//! Core data model shared by the queue, the learning loop and the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A single user-submitted query awaiting processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub query: String,
    pub enqueued_at: DateTime<Utc>,
}

impl Task {
    /// Build a task stamped with the current time.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            enqueued_at: Utc::now(),
        }
    }
}

/// Which configured provider slot produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSlot {
    Primary,
    Secondary,
}

/// A normalized search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source_provider: ProviderSlot,
}

/// How the aggregator chooses between the primary and secondary providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPreference {
    /// Primary first; secondary only if the primary fails or comes back empty.
    #[default]
    Auto,
    PrimaryOnly,
    SecondaryOnly,
    /// Primary hits followed by secondary hits, capped in total.
    Merge,
}

impl SearchPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::PrimaryOnly => "primary_only",
            Self::SecondaryOnly => "secondary_only",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for SearchPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "primary_only" | "primary" => Ok(Self::PrimaryOnly),
            "secondary_only" | "secondary" => Ok(Self::SecondaryOnly),
            "merge" | "both" => Ok(Self::Merge),
            other => Err(format!("unknown search preference `{other}`")),
        }
    }
}

/// Where a learned query came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Drained from the task queue.
    Queue,
    /// A configured (or caller-supplied) cycle topic.
    Topic,
    /// A direct learn request outside any cycle.
    Manual,
}

/// The persisted outcome of one search-and-summarize operation.
///
/// Immutable once built. `error` is set on error entries written for items
/// that failed outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedRecord {
    pub id: Uuid,
    pub query: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    pub origin: RecordOrigin,
    pub preference: SearchPreference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LearnedRecord {
    pub fn new(
        query: impl Into<String>,
        summary: impl Into<String>,
        results: Vec<SearchResult>,
        origin: RecordOrigin,
        preference: SearchPreference,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            summary: summary.into(),
            timestamp: Utc::now(),
            results,
            origin,
            preference,
            error: None,
        }
    }

    /// An error entry for an item whose learn step failed.
    pub fn error_entry(
        query: impl Into<String>,
        origin: RecordOrigin,
        preference: SearchPreference,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            summary: format!("learning failed: {error}"),
            error: Some(error),
            ..Self::new(query, String::new(), Vec::new(), origin, preference)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregated outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Queued tasks processed, including failed ones.
    pub queue_processed: usize,
    /// Topics processed, including failed ones.
    pub topics_processed: usize,
    /// Items that ended in an error entry.
    pub failures: usize,
    pub summary_message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Point-in-time scheduler status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_seconds: u64,
    pub queue_size: usize,
    pub next_run_at: Option<DateTime<Utc>>,
    /// Whether a cycle (scheduled or on-demand) is executing right now.
    pub cycle_in_progress: bool,
    /// Completed cycles, persisted across restarts.
    pub runs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_message: Option<String>,
    pub degraded: crate::degraded::DegradedSnapshot,
}
