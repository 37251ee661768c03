//! Thread-safe task queue with snapshot-and-clear draining.
//!
//! Producers (gateway handlers, CLI) call [`TaskQueue::enqueue`] from any
//! thread; the cycle runner takes everything at once with
//! [`TaskQueue::drain_all`]. Both run under the same short critical section,
//! so a task is seen by exactly one drain.

use crate::degraded::{DegradedCounters, FailureClass};
use crate::types::Task;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// FIFO queue of pending user queries.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Mutex<Vec<Task>>,
    audit: Option<AuditLog>,
    counters: Option<Arc<DegradedCounters>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every accepted task to a JSONL audit file at `path`.
    ///
    /// The audit log is independent of the in-memory queue: it is never read
    /// back and a failed audit write does not reject the task.
    pub fn with_audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit = Some(AuditLog {
            path: path.into(),
            lock: Mutex::new(()),
        });
        self
    }

    /// Report invalid input and audit failures to `counters`.
    pub fn with_counters(mut self, counters: Arc<DegradedCounters>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Queue `query`, trimmed. Blank input is ignored and `false` returned.
    pub fn enqueue(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            if let Some(counters) = &self.counters {
                counters.record(FailureClass::InvalidInput, "blank query not enqueued");
            }
            return false;
        }

        let task = Task::new(query);
        let depth = {
            let mut tasks = self.lock();
            tasks.push(task.clone());
            tasks.len()
        };
        tracing::debug!(depth, "task enqueued");

        if let Some(audit) = &self.audit
            && let Err(e) = audit.append(&task)
        {
            match &self.counters {
                Some(counters) => counters.record(
                    FailureClass::Persistence,
                    &format!("queue audit write failed: {e}"),
                ),
                None => tracing::warn!(error = %e, "queue audit write failed"),
            }
        }
        true
    }

    /// Up to `limit` queued queries, newest first. Does not modify the queue.
    pub fn peek_recent(&self, limit: usize) -> Vec<String> {
        self.lock()
            .iter()
            .rev()
            .take(limit)
            .map(|t| t.query.clone())
            .collect()
    }

    /// Remove and return every queued task in enqueue order.
    ///
    /// Enqueues that race with the drain either land in this snapshot or in
    /// the fresh queue left behind, never both.
    pub fn drain_all(&self) -> Vec<Task> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        // A panic while holding the guard cannot leave the Vec half-updated:
        // push and take are the only mutations.
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    fn append(&self, task: &Task) -> std::io::Result<()> {
        let mut line = serde_json::to_string(task)?;
        line.push('\n');
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
