//! Scheduler background loop.
//!
//! Spawns one tokio task that optionally runs a cycle right away, then
//! alternates between a cancellable sleep and a cycle until stopped.

use crate::cycle::CycleRunner;
use crate::types::SchedulerStatus;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Shortest accepted interval.
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Periodic driver for a [`CycleRunner`].
///
/// `Stopped -> Running -> Stopped`, with `start` and `shutdown` idempotent.
pub struct LearningScheduler {
    runner: Arc<CycleRunner>,
    inner: Mutex<Inner>,
}

struct Inner {
    interval_secs: u64,
    active: Option<ActiveLoop>,
}

/// Next wake-up time, owned by one loop.
type NextRun = Arc<Mutex<Option<DateTime<Utc>>>>;

/// One started loop. Each loop writes only its own `next_run`, so a loop
/// still finishing its last cycle after a restart cannot touch the new one's.
struct ActiveLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    next_run: NextRun,
}

impl LearningScheduler {
    pub fn new(runner: Arc<CycleRunner>, interval_secs: u64) -> Self {
        Self {
            runner,
            inner: Mutex::new(Inner {
                interval_secs: interval_secs.max(MIN_INTERVAL_SECS),
                active: None,
            }),
        }
    }

    pub fn runner(&self) -> &Arc<CycleRunner> {
        &self.runner
    }

    /// Start the background loop. Returns `false` if it was already running.
    ///
    /// `interval_secs` is clamped to at least [`MIN_INTERVAL_SECS`]. With
    /// `run_immediately` the first cycle runs as soon as the loop starts,
    /// before the first wait.
    pub fn start(&self, interval_secs: u64, run_immediately: bool) -> bool {
        let mut inner = self.lock_inner();
        if inner.active.as_ref().is_some_and(ActiveLoop::is_live) {
            debug!("scheduler already running, start ignored");
            return false;
        }

        let interval_secs = interval_secs.max(MIN_INTERVAL_SECS);
        inner.interval_secs = interval_secs;
        self.runner.note_interval(interval_secs);

        let cancel = CancellationToken::new();
        let next_run = NextRun::default();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.runner),
            Duration::from_secs(interval_secs),
            run_immediately,
            cancel.clone(),
            Arc::clone(&next_run),
        ));
        inner.active = Some(ActiveLoop {
            cancel,
            handle,
            next_run,
        });

        info!(interval_secs, run_immediately, "scheduler started");
        true
    }

    /// Signal the loop to stop. Returns `false` if it was not running.
    ///
    /// A cycle already in progress runs to completion; no further cycle is
    /// started afterwards.
    pub fn shutdown(&self) -> bool {
        let Some(active) = self.lock_inner().active.take() else {
            debug!("scheduler not running, shutdown ignored");
            return false;
        };
        let was_live = active.is_live();
        active.cancel.cancel();
        if was_live {
            info!("scheduler stopping");
        }
        was_live
    }

    /// Stop and wait for the loop to exit, including any in-flight cycle.
    pub async fn shutdown_and_wait(&self) {
        let active = self.lock_inner().active.take();
        if let Some(active) = active {
            active.cancel.cancel();
            let _ = active.handle.await;
            info!("scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_inner()
            .active
            .as_ref()
            .is_some_and(ActiveLoop::is_live)
    }

    pub fn interval_secs(&self) -> u64 {
        self.lock_inner().interval_secs
    }

    /// When the active loop next runs a cycle. `None` while stopped.
    pub fn next_run_at(&self) -> Option<DateTime<Utc>> {
        let inner = self.lock_inner();
        let active = inner.active.as_ref().filter(|a| a.is_live())?;
        *active.next_run.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Current status. Never waits on a running cycle.
    pub fn status(&self) -> SchedulerStatus {
        let running = self.is_running();
        let state = self.runner.state();
        SchedulerStatus {
            running,
            interval_seconds: self.interval_secs(),
            queue_size: self.runner.queue().len(),
            next_run_at: if running { self.next_run_at() } else { None },
            cycle_in_progress: self.runner.is_running_cycle(),
            runs: state.runs,
            last_run_at: state.last_run_at,
            last_message: state.last_message,
            degraded: self.runner.learner().counters().snapshot(),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for LearningScheduler {
    fn drop(&mut self) {
        if let Some(active) = self.lock_inner().active.take() {
            active.cancel.cancel();
        }
    }
}

impl ActiveLoop {
    fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.handle.is_finished()
    }
}

async fn run_loop(
    runner: Arc<CycleRunner>,
    interval: Duration,
    run_immediately: bool,
    cancel: CancellationToken,
    next_run_at: NextRun,
) {
    if run_immediately {
        set_next_run(&next_run_at, Some(Utc::now()));
        runner.run_cycle(None).await;
    }

    loop {
        if cancel.is_cancelled() {
            break;
        }
        let next = chrono::Duration::from_std(interval)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
        set_next_run(&next_run_at, next);
        debug!(next_run_at = ?next, "waiting for next cycle");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        runner.run_cycle(None).await;
    }

    set_next_run(&next_run_at, None);
    debug!("scheduler loop exited");
}

fn set_next_run(slot: &Mutex<Option<DateTime<Utc>>>, value: Option<DateTime<Utc>>) {
    *slot.lock().unwrap_or_else(|p| p.into_inner()) = value;
}
