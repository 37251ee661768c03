//! Background learning scheduler.
//!
//! Runs the cycle runner on a fixed interval with an optional immediate first
//! run and a clean, cancellable start/stop lifecycle.

pub mod runner;

pub use runner::{LearningScheduler, MIN_INTERVAL_SECS};
