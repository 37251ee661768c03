//! Persisted scheduler status (`state.json`).
//!
//! Written after every cycle via a temp file that is flushed to disk before
//! the rename, so readers only ever see a complete previous or a complete new
//! state, even after a crash.

use crate::error::{LearnError, Result};
use crate::types::CycleReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Status that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnState {
    pub interval_secs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub runs: u64,
    pub last_queue_processed: usize,
    pub last_topics_processed: usize,
    pub last_message: Option<String>,
}

impl LearnState {
    /// Fold a finished cycle into the state.
    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.runs += 1;
        self.last_run_at = report.finished_at.or_else(|| Some(Utc::now()));
        self.last_queue_processed = report.queue_processed;
        self.last_topics_processed = report.topics_processed;
        self.last_message = Some(report.summary_message.clone());
    }
}

/// Location of the state file.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state; a missing file is the default state.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Store`] if the file exists but cannot be read
    /// or parsed.
    pub fn load(&self) -> Result<LearnState> {
        let bytes = match std::fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LearnState::default());
            }
            Err(e) => return Err(LearnError::Store(format!("cannot read state: {e}"))),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| LearnError::Store(format!("cannot parse state: {e}")))
    }

    /// Load, treating an unreadable file as the default state.
    pub fn load_or_default(&self) -> LearnState {
        self.load().unwrap_or_else(|e| {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "ignoring unreadable state file"
            );
            LearnState::default()
        })
    }

    /// Atomically replace the state file.
    ///
    /// # Errors
    ///
    /// Returns [`LearnError::Store`] if the temp file cannot be written or
    /// renamed into place.
    pub fn save(&self, state: &LearnState) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| LearnError::Store(format!("cannot create state dir: {e}")))?;
        }

        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| LearnError::Store(format!("cannot serialize state: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        write_synced(&tmp, &json)
            .map_err(|e| LearnError::Store(format!("cannot write state: {e}")))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| LearnError::Store(format!("cannot replace state: {e}")))?;
        Ok(())
    }
}

/// Create or truncate `path`, write `bytes` and fsync before returning.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
