//! Tracing setup for the binary.
//!
//! Logs go to stderr and, optionally, to a daily-rolling file under
//! `<data_dir>/logs/`. Old log files are pruned on startup: anything older
//! than [`MAX_LOG_AGE_DAYS`] days, and anything beyond the newest
//! [`MAX_LOG_FILES`].

use crate::error::{LearnError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Maximum age (in days) of log files to keep.
pub const MAX_LOG_AGE_DAYS: u64 = 7;

/// Maximum number of log files to keep.
pub const MAX_LOG_FILES: usize = 10;

/// Prefix of every rolled log file, e.g. `autolearn.log.2026-10-19`.
pub const LOG_FILE_PREFIX: &str = "autolearn.log";

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "autolearn=info,autolearn_search=info";

/// Install the global subscriber.
///
/// With `log_dir` set, a file layer is added and the returned guard must be
/// held for the life of the process so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            prune_old_logs(dir);
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LearnError::Config(format!("failed to install log subscriber: {e}")))?;

    Ok(guard)
}

/// Remove log files older than [`MAX_LOG_AGE_DAYS`] or beyond [`MAX_LOG_FILES`].
pub fn prune_old_logs(log_dir: &Path) {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(MAX_LOG_AGE_DAYS * 86_400))
        .unwrap_or(UNIX_EPOCH);
    prune_old_logs_with_cutoff(log_dir, cutoff, MAX_LOG_FILES);
}

fn prune_old_logs_with_cutoff(log_dir: &Path, cutoff: SystemTime, max_files: usize) {
    let Ok(dir) = fs::read_dir(log_dir) else {
        return;
    };
    let mut entries: Vec<(PathBuf, SystemTime)> = dir
        .flatten()
        .filter_map(|e| {
            let path = e.path();
            let name = path.file_name()?.to_str()?;
            if !name.starts_with(LOG_FILE_PREFIX) {
                return None;
            }
            let mtime = path.metadata().ok()?.modified().ok()?;
            Some((path, mtime))
        })
        .collect();

    // Newest first.
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    for (i, (path, mtime)) in entries.iter().enumerate() {
        if (*mtime < cutoff || i >= max_files)
            && let Err(e) = fs::remove_file(path)
        {
            tracing::debug!("could not prune {}: {e}", path.display());
        }
    }
}
