//! Autolearn: a background learning loop over web search.
//!
//! User queries are queued, and on every cycle the queue is drained and a
//! fixed list of topics is walked. Each query is searched, summarized and
//! appended to a durable record log.
//!
//! # Architecture
//!
//! - **Queue**: [`queue::TaskQueue`] holds pending queries behind a mutex
//! - **Aggregator**: [`aggregator::SearchAggregator`] combines a primary and a
//!   secondary [`provider::SearchProvider`] according to a preference
//! - **Learn-once**: [`learn::Learner`] searches, summarizes with fallback, and
//!   persists one [`types::LearnedRecord`]
//! - **Cycle**: [`cycle::CycleRunner`] runs one mutually exclusive pass
//! - **Scheduler**: [`scheduler::LearningScheduler`] repeats cycles on an
//!   interval with cancellable waits
//! - **Service**: [`service::LearningService`] wires it all from
//!   [`config::LearnConfig`] and is what the gateway and CLI talk to
//!
//! Every external failure is contained where it happens, classified as a
//! [`degraded::FailureClass`], logged and counted.

pub mod aggregator;
pub mod config;
pub mod cycle;
pub mod degraded;
pub mod error;
pub mod gateway;
pub mod learn;
pub mod logging;
pub mod paths;
pub mod provider;
pub mod queue;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod store;
pub mod summarize;
pub mod types;

pub use config::LearnConfig;
pub use error::{LearnError, Result};
pub use service::LearningService;
pub use types::{
    CycleReport, LearnedRecord, RecordOrigin, SchedulerStatus, SearchPreference, SearchResult,
    Task,
};
